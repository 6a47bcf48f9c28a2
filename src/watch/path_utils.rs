// src/watch/path_utils.rs

//! Path arithmetic shared by the router and the bootstrapper.

use std::path::{Component, Path, PathBuf};

/// First configured root that `path` lives under.
///
/// Roots are assumed not to overlap; if they do, the earlier one wins.
pub fn find_root<'a>(roots: &'a [PathBuf], path: &Path) -> Option<&'a Path> {
    roots
        .iter()
        .find(|root| path.starts_with(root))
        .map(PathBuf::as_path)
}

/// `path` relative to `root`, or `None` when it is not beneath it.
pub fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    path.strip_prefix(root).ok().map(Path::to_path_buf)
}

/// Directory in the destination that mirrors `root`.
///
/// Each root is mirrored under its own final component so several roots can
/// share one destination without colliding.
pub fn destination_for_root(destination: &Path, root: &Path) -> PathBuf {
    match root.file_name() {
        Some(name) => destination.join(name),
        None => destination.to_path_buf(),
    }
}

/// Where a source entry with relative path `relative` is mirrored.
pub fn backup_target(destination: &Path, root: &Path, relative: &Path) -> PathBuf {
    destination_for_root(destination, root).join(relative)
}

/// Name used for a stale file's non-destructive copy: the relative path with
/// separators removed, prefixed by `prefix`.
///
/// `a/b/c.txt` with prefix `"Novo - "` becomes `"Novo - abc.txt"`.
pub fn diverted_name(prefix: &str, relative: &Path) -> String {
    let flattened: String = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    format!("{prefix}{flattened}")
}

/// Full destination path for a diverted copy.
pub fn diverted_target(destination: &Path, root: &Path, prefix: &str, relative: &Path) -> PathBuf {
    destination_for_root(destination, root).join(diverted_name(prefix, relative))
}

/// Lexically normalized form used as a ledger key.
///
/// Drops `.` components and redundant separators; does not touch the
/// filesystem, so symlinks are not resolved.
pub fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn diversion_strips_separators_and_prefixes_marker() {
        assert_eq!(diverted_name("Novo - ", Path::new("a/b/c.txt")), "Novo - abc.txt");
        assert_eq!(diverted_name("Novo - ", Path::new("f.txt")), "Novo - f.txt");
    }

    #[test]
    fn first_matching_root_wins() {
        let roots = vec![PathBuf::from("/data/docs"), PathBuf::from("/data")];
        assert_eq!(
            find_root(&roots, Path::new("/data/docs/x.txt")),
            Some(Path::new("/data/docs"))
        );
        assert_eq!(find_root(&roots, Path::new("/data/y.txt")), Some(Path::new("/data")));
        assert_eq!(find_root(&roots, Path::new("/other/z.txt")), None);
    }

    #[test]
    fn root_prefix_is_component_wise() {
        let roots = vec![PathBuf::from("/data/doc")];
        assert_eq!(find_root(&roots, Path::new("/data/docs/x.txt")), None);
    }

    #[test]
    fn backup_target_nests_under_root_name() {
        let target = backup_target(
            Path::new("/mnt/backup"),
            Path::new("/home/ana/projects"),
            Path::new("sub/f.txt"),
        );
        assert_eq!(target, PathBuf::from("/mnt/backup/projects/sub/f.txt"));
    }

    #[test]
    fn diverted_target_sits_in_root_destination() {
        let target = diverted_target(
            Path::new("/mnt/backup"),
            Path::new("/src"),
            "Novo - ",
            Path::new("a/b/c.txt"),
        );
        assert_eq!(target, PathBuf::from("/mnt/backup/src/Novo - abc.txt"));
    }

    #[test]
    fn normalize_drops_cur_dir() {
        assert_eq!(normalize(Path::new("/src/./a//b.txt")), PathBuf::from("/src/a/b.txt"));
    }

    proptest! {
        #[test]
        fn diverted_name_never_contains_separator(parts in proptest::collection::vec("[a-zA-Z0-9 ._-]{1,8}", 1..5)) {
            let rel: PathBuf = parts.iter().filter(|p| *p != "." && *p != "..").collect();
            let name = diverted_name("Novo - ", &rel);
            prop_assert!(!name.contains('/'));
            prop_assert!(name.starts_with("Novo - "));
        }
    }
}
