#[cfg(any(feature = "compression-gzip", feature = "compression-zstd"))]
mod common;

#[cfg(any(feature = "compression-gzip", feature = "compression-zstd"))]
mod compression_tests {
    use super::common::*;
    use csvbind::io::compression::{detect, CompressionCodec};
    use csvbind::io::open_source;
    use csvbind::{read_vec, write};
    use std::fs;
    use std::io::Read;
    use std::path::Path;

    fn people() -> Vec<Person> {
        vec![
            person("John", 30, "Main St", "New York"),
            person("Jane", 25, "Second St", "Boston"),
        ]
    }

    fn decompressed(path: &Path) -> anyhow::Result<String> {
        let mut text = String::new();
        open_source(path)?.read_to_string(&mut text)?;
        Ok(text)
    }

    fn roundtrip(file: &str) -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(file);
        write(&path, &people())?;

        let raw = fs::read(&path)?;
        assert!(!raw.starts_with(b"name,"), "{file} was written uncompressed");
        assert_eq!(read_vec::<Person>(&path)?, people());
        Ok(())
    }

    fn append_keeps_stream_readable(file: &str) -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(file);
        write(&path, &people()[..1])?;
        write(&path, &people()[1..])?;

        assert_eq!(
            decompressed(&path)?,
            "name,age,address_street,address_city\n\
             John,30,Main St,New York\n\
             name,age,address_street,address_city\n\
             Jane,25,Second St,Boston\n"
        );
        Ok(())
    }

    #[test]
    fn unknown_extension_is_plain() {
        assert!(detect(Path::new("data.csv")).is_none());
        assert!(detect(Path::new("data")).is_none());
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn gzip_roundtrip() -> anyhow::Result<()> {
        assert_eq!(detect(Path::new("x.CSV.GZ")).map(|c| c.name()), Some("gzip"));
        roundtrip("people.csv.gz")
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn gzip_append_concatenates_members() -> anyhow::Result<()> {
        append_keeps_stream_readable("people.csv.gz")
    }

    #[cfg(feature = "compression-zstd")]
    #[test]
    fn zstd_roundtrip() -> anyhow::Result<()> {
        assert_eq!(detect(Path::new("x.csv.zst")).map(|c| c.name()), Some("zstd"));
        roundtrip("people.csv.zst")
    }

    #[cfg(feature = "compression-zstd")]
    #[test]
    fn zstd_append_concatenates_frames() -> anyhow::Result<()> {
        append_keeps_stream_readable("people.csv.zst")
    }
}
