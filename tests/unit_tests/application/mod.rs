mod request_validator_test;
