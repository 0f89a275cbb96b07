//! Reading documents from and writing output to the file system.

use crate::config::{Input, Output};
use ansi_term::Color;
use slog::{debug, trace};
use std::{fs, path::Path};

/// Load a document, deciding from its name whether it holds markup or a
/// serialized tree.
pub fn load_document(path: &Path) -> Result<(String, Input), String> {
    let name = path.to_string_lossy();
    debug!(slog_scope::logger(), "Loading document {}...", name);

    let contents = fs::read_to_string(path)
        .map_err(|e| format!("error reading the file {}—{}", name, e))?;
    let format = Input::from_path(&name);

    debug!(
        slog_scope::logger(),
        "Document {} loaded ({} bytes), reading it as {:?}.",
        name,
        contents.len(),
        format
    );
    Ok((contents, format))
}

/// Save rendered output in a file.
pub fn save_output(path: &Path, output: &str, format: Output) -> Result<(), String> {
    let name = path.to_string_lossy();
    eprintln!(
        "{} Saving {} as {:?}...",
        Color::Green.paint("INFO"),
        Color::Blue.paint(&*name),
        format
    );

    if path.exists() {
        trace!(slog_scope::logger(), "Overwriting {}", name);
    }
    fs::write(path, output).map_err(|e| format!("error writing the file {}—{}", name, e))?;

    debug!(slog_scope::logger(), "File {} saved.", name);
    eprintln!("{} Done", Color::Green.paint("INFO"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("refnotes-fs-{}-{}", std::process::id(), name))
    }

    mod load_document {
        use super::*;

        #[test]
        fn markup() {
            let path = temp_path("doc.txt");
            fs::write(&path, "Text{{reference}}n{{/reference}}").unwrap();

            let (contents, format) = load_document(&path).unwrap();
            assert!(contents.starts_with("Text"));
            assert_eq!(format, Input::Markup);

            let _ = fs::remove_file(&path);
        }

        #[test]
        fn json_tree() {
            let path = temp_path("tree.json");
            fs::write(&path, r#"{"type":"document"}"#).unwrap();

            assert_eq!(load_document(&path).unwrap().1, Input::Json);

            let _ = fs::remove_file(&path);
        }

        #[test]
        fn missing_file() {
            let err = load_document(Path::new("/definitely/not/here.txt")).unwrap_err();

            assert!(err.starts_with("error reading the file /definitely/not/here.txt"));
        }
    }

    mod save_output {
        use super::*;

        #[test]
        fn saved() {
            let path = temp_path("out.html");

            save_output(&path, "<p>x</p>\n", Output::Html).unwrap();
            assert_eq!(fs::read_to_string(&path).unwrap(), "<p>x</p>\n");

            let _ = fs::remove_file(&path);
        }

        #[test]
        fn missing_directory() {
            let err = save_output(Path::new("/definitely/not/out.html"), "", Output::Html)
                .unwrap_err();

            assert!(err.starts_with("error writing the file"));
        }
    }
}
