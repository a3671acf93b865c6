//! Bucket adapter over the real OSS connector
//!
//! Nothing here reaches the network: presigning and URL building are local.

use aliyun_bucket::{AliyunBucket, AliyunSettings, StorageError, UrlOptions};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn settings() -> AliyunSettings {
    AliyunSettings::new("test-id", "test-secret", "photos")
}

#[tokio::test]
async fn test_private_url_is_signed_https() {
    init_tracing();
    let bucket = AliyunBucket::new(&settings()).unwrap();

    let url = bucket
        .private_url("/avatars/1.png", &UrlOptions::default())
        .await
        .unwrap();
    assert!(
        url.starts_with("https://photos.oss-cn-hangzhou.aliyuncs.com/avatars/1.png?"),
        "unexpected url {}",
        url
    );
    assert!(url.contains("Expires="));
    assert!(url.contains("Signature="));
    assert!(!url.contains("test-secret"));
}

#[tokio::test]
async fn test_private_thumb_url_uses_image_host() {
    init_tracing();
    let mut settings = settings();
    settings.area = "cn-beijing".to_string();
    let bucket = AliyunBucket::new(&settings).unwrap();

    let url = bucket
        .private_url("avatars/1.png", &UrlOptions::thumb("@!small"))
        .await
        .unwrap();
    assert!(
        url.starts_with("https://photos.img-cn-beijing.aliyuncs.com/avatars/1.png@!small?"),
        "unexpected url {}",
        url
    );
}

#[tokio::test]
async fn test_public_bucket_urls_are_unsigned() {
    init_tracing();
    let bucket = AliyunBucket::new(&settings()).unwrap();

    let url = bucket
        .url("avatars/1.png", &UrlOptions::default())
        .await
        .unwrap();
    assert_eq!(url, "https://photos.oss-cn-hangzhou.aliyuncs.com/avatars/1.png");
}

#[test]
fn test_host_without_scheme_rejected() {
    let mut settings = settings();
    settings.host = Some("cdn.example.com".to_string());

    let err = AliyunBucket::new(&settings).unwrap_err();
    assert!(matches!(err, StorageError::InvalidHost(_)));
}
