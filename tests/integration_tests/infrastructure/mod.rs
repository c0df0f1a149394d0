mod gemini_client_test;
