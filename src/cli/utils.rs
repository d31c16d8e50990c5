use simple_error::{SimpleResult, bail};

/// Check a required input filename
///
/// Assumes no logger has been configured yet
///
pub fn check_required_filename(filename: &str, label: &str) -> SimpleResult<()> {
    if filename.is_empty() {
        bail!("Must specify {label} file");
    }
    let path = std::path::Path::new(&filename);
    if !path.exists() {
        bail!("Can't find specified {label} file: '{filename}'");
    }
    if !path.is_file() {
        bail!("Specified {label} file path does not appear to be a file: '{filename}'");
    }
    Ok(())
}

/// Check a required input filename, and that the file is not empty
///
/// Assumes no logger has been configured yet
///
pub fn check_required_nonempty_filename(filename: &str, label: &str) -> SimpleResult<()> {
    check_required_filename(filename, label)?;
    let is_empty = match std::fs::metadata(filename) {
        Ok(x) => x.len() == 0,
        Err(e) => bail!("Can't read specified {label} file: '{filename}': {e}"),
    };
    if is_empty {
        bail!("Specified {label} file is empty: '{filename}'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_required_filename() {
        let dir = tempfile::tempdir().unwrap();
        let dir_name = dir.path().to_str().unwrap();
        assert!(check_required_filename("", "test").is_err());
        assert!(check_required_filename(dir_name, "test").is_err());

        let filename = dir.path().join("foo.txt");
        let filename = filename.to_str().unwrap();
        assert!(check_required_filename(filename, "test").is_err());

        std::fs::write(filename, "").unwrap();
        assert!(check_required_filename(filename, "test").is_ok());
        assert!(check_required_nonempty_filename(filename, "test").is_err());

        std::fs::write(filename, "ACGT").unwrap();
        assert!(check_required_nonempty_filename(filename, "test").is_ok());
    }
}
