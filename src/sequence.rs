//! The ordered list of images that becomes the video

use crate::image_loader::{has_extension, IMAGE_EXTENSIONS};
use crate::natural_sort::sort_naturally;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Ordered image paths, one per output frame
///
/// Built once from a selection (naturally sorted), then freely reordered
/// until a run takes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    paths: Vec<PathBuf>,
}

impl Sequence {
    /// Keep the given order as-is
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Build from a selection, sorted naturally by file name
    pub fn from_selection(mut paths: Vec<PathBuf>) -> Self {
        sort_naturally(&mut paths);
        Self { paths }
    }

    /// All supported images directly inside `dir`, naturally sorted
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.is_file() && has_extension(&path, IMAGE_EXTENSIONS) {
                paths.push(path);
            }
        }
        Ok(Self::from_selection(paths))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn into_paths(self) -> Vec<PathBuf> {
        self.paths
    }

    /// Move the item at `from` so that it ends up at index `to`
    ///
    /// Same as removing it and inserting it again at `to`.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.paths.len();
        if from >= len || to >= len {
            return Err(Error::InvalidInput(format!(
                "Cannot move item {} to {} in a sequence of {}",
                from, to, len
            )));
        }

        let item = self.paths.remove(from);
        self.paths.insert(to, item);
        Ok(())
    }

    /// Remove and return the item at `index`
    pub fn remove(&mut self, index: usize) -> Result<PathBuf> {
        if index >= self.paths.len() {
            return Err(Error::InvalidInput(format!(
                "No item {} in a sequence of {}",
                index,
                self.paths.len()
            )));
        }
        Ok(self.paths.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(names: &[&str]) -> Sequence {
        Sequence::new(names.iter().map(PathBuf::from).collect())
    }

    fn names(seq: &Sequence) -> Vec<String> {
        seq.paths()
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_from_selection_sorts_naturally() {
        let s = Sequence::from_selection(vec![
            PathBuf::from("img10.png"),
            PathBuf::from("img2.png"),
            PathBuf::from("img1.png"),
        ]);
        assert_eq!(names(&s), vec!["img1.png", "img2.png", "img10.png"]);
    }

    #[test]
    fn test_move_item_forward_and_back() {
        let mut s = seq(&["a", "b", "c", "d"]);
        s.move_item(0, 2).unwrap();
        assert_eq!(names(&s), vec!["b", "c", "a", "d"]);

        s.move_item(3, 0).unwrap();
        assert_eq!(names(&s), vec!["d", "b", "c", "a"]);

        s.move_item(1, 1).unwrap();
        assert_eq!(names(&s), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_move_item_out_of_range() {
        let mut s = seq(&["a", "b"]);
        assert!(s.move_item(2, 0).is_err());
        assert!(s.move_item(0, 2).is_err());
        assert_eq!(names(&s), vec!["a", "b"]);
    }

    #[test]
    fn test_remove() {
        let mut s = seq(&["a", "b", "c"]);
        assert_eq!(s.remove(1).unwrap(), PathBuf::from("b"));
        assert_eq!(s.len(), 2);
        assert!(s.remove(5).is_err());
    }

    #[test]
    fn test_from_dir_filters_and_sorts() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["s10.jpg", "s2.PNG", "notes.txt", "s1.bmp", "anim.gif"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        let s = Sequence::from_dir(dir.path()).unwrap();
        let files: Vec<_> = s
            .paths()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(files, vec!["s1.bmp", "s2.PNG", "s10.jpg"]);
    }
}
