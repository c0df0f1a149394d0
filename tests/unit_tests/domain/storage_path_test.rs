use dubgate::domain::{JobId, StoragePath};

#[test]
fn given_job_and_filename_when_building_path_then_joins_with_slash() {
    let job = JobId::parse("0123456789ab").unwrap();
    let path = StoragePath::new(&job, "speech.wav");
    assert_eq!(path.as_str(), "0123456789ab/speech.wav");
}

#[test]
fn given_traversal_filename_when_building_job_file_then_rejected() {
    let job = JobId::new();
    assert!(StoragePath::for_job_file(&job, "../secret").is_none());
    assert!(StoragePath::for_job_file(&job, "a\\b.wav").is_none());
    assert!(StoragePath::for_job_file(&job, ".hidden").is_none());
    assert!(StoragePath::for_job_file(&job, "").is_none());
}

#[test]
fn given_plain_filename_when_building_job_file_then_accepted() {
    let job = JobId::new();
    let path = StoragePath::for_job_file(&job, "background.wav").unwrap();
    assert!(path.as_str().ends_with("/background.wav"));
}
