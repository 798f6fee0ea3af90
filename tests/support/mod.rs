#![allow(dead_code)]

pub mod builders;

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use umya_spreadsheet::Spreadsheet;

pub const REPORT_SHEET: &str = "Sheet1";

pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn create_workbook<F>(&self, name: &str, f: F) -> PathBuf
    where
        F: FnOnce(&mut Spreadsheet),
    {
        let path = self.path(name);
        let mut book = umya_spreadsheet::new_file();
        f(&mut book);
        umya_spreadsheet::writer::xlsx::write(&book, &path).expect("write workbook");
        path
    }

    /// Every backup the updater left next to `workbook`.
    pub fn backups_of(&self, workbook: &Path) -> Vec<PathBuf> {
        let prefix = format!(
            "{}.backup_",
            workbook.file_name().unwrap().to_string_lossy()
        );
        let mut found: Vec<PathBuf> = std::fs::read_dir(self.root())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().starts_with(&prefix))
                    .unwrap_or(false)
            })
            .collect();
        found.sort();
        found
    }
}

pub fn reopen(path: &Path) -> Spreadsheet {
    umya_spreadsheet::reader::xlsx::read(path).expect("read workbook")
}
