// ═══════════════════════════════════════════════════════════════════
// Image Tests — DataUriEncoder, ImageSource
// ═══════════════════════════════════════════════════════════════════

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use trading_journal_core::errors::JournalError;
use trading_journal_core::images::data_uri::{mime_for, DataUriEncoder, DEFAULT_MAX_IMAGE_BYTES};
use trading_journal_core::images::traits::{ImageEncoder, ImageSource};

mod mime {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(mime_for("a.png"), Some("image/png"));
        assert_eq!(mime_for("a.JPG"), Some("image/jpeg"));
        assert_eq!(mime_for("shot.2024.jpeg"), Some("image/jpeg"));
        assert_eq!(mime_for("x.webp"), Some("image/webp"));
    }

    #[test]
    fn unknown_or_missing_extension() {
        assert_eq!(mime_for("notes.txt"), None);
        assert_eq!(mime_for("README"), None);
    }
}

mod encoding {
    use super::*;

    #[tokio::test]
    async fn bytes_become_data_uri() {
        let bytes = vec![1u8, 2, 3, 250, 251, 252];
        let uri = DataUriEncoder::default()
            .encode(&ImageSource::from_bytes("c.gif", bytes.clone()))
            .await
            .unwrap();
        let payload = uri.strip_prefix("data:image/gif;base64,").unwrap();
        assert_eq!(STANDARD.decode(payload).unwrap(), bytes);
    }

    #[tokio::test]
    async fn reads_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        std::fs::write(&path, [9u8, 8, 7]).unwrap();
        let uri = DataUriEncoder::default()
            .encode(&ImageSource::from_path(&path))
            .await
            .unwrap();
        assert_eq!(uri, format!("data:image/png;base64,{}", STANDARD.encode([9u8, 8, 7])));
    }

    #[tokio::test]
    async fn missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = DataUriEncoder::default()
            .encode(&ImageSource::from_path(dir.path().join("gone.png")))
            .await
            .unwrap_err();
        assert!(matches!(err, JournalError::ImageEncoding(_)));
    }

    #[tokio::test]
    async fn size_limit_applies_to_bytes_and_files() {
        let encoder = DataUriEncoder::new(4);
        assert_eq!(encoder.max_bytes(), 4);
        assert!(encoder
            .encode(&ImageSource::from_bytes("a.png", vec![0; 5]))
            .await
            .is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        std::fs::write(&path, [0u8; 5]).unwrap();
        assert!(encoder.encode(&ImageSource::from_path(&path)).await.is_err());
    }

    #[tokio::test]
    async fn empty_and_non_image_files_fail() {
        let encoder = DataUriEncoder::default();
        assert_eq!(encoder.max_bytes(), DEFAULT_MAX_IMAGE_BYTES);
        assert!(encoder.encode(&ImageSource::from_bytes("a.png", Vec::new())).await.is_err());
        assert!(encoder.encode(&ImageSource::from_bytes("a.exe", vec![1])).await.is_err());
    }

    #[test]
    fn file_name_from_path() {
        assert_eq!(ImageSource::from_path("/tmp/x/shot.png").file_name(), "shot.png");
        assert_eq!(ImageSource::from_bytes("b.gif", vec![]).file_name(), "b.gif");
    }
}
