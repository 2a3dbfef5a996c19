// Page index
// A directory of Markdown pages acting as search and create backend for the
// link editor.

use crate::search::SearchResult;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MAX_RESULTS: usize = 8;

pub struct PageIndex {
    base_path: PathBuf,
}

impl PageIndex {
    pub fn new(base_path: PathBuf) -> Self {
        PageIndex { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Recursively list all markdown pages
    /// Returns relative paths without extension (e.g., "project-a/standup")
    pub fn list_pages(&self) -> Result<Vec<String>, String> {
        let mut pages = Vec::new();
        for entry in WalkDir::new(&self.base_path).sort_by_file_name() {
            let entry = entry.map_err(|e| format!("Failed to read directory: {}", e))?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().and_then(|s| s.to_str()) != Some("md")
            {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(&self.base_path) {
                let name = relative
                    .with_extension("")
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                pages.push(name);
            }
        }
        Ok(pages)
    }

    /// Pages matching `query`, best match first
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>, String> {
        let mut scored: Vec<(i32, String)> = self
            .list_pages()?
            .into_iter()
            .filter_map(|name| fuzzy_score(query, &name).map(|score| (score, name)))
            .collect();
        // Sort by score desc then title asc
        scored.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| page_title(&a.1).cmp(page_title(&b.1)))
                .then_with(|| a.1.cmp(&b.1))
        });

        Ok(scored
            .into_iter()
            .take(MAX_RESULTS)
            .map(|(_, name)| page_result(&name))
            .collect())
    }

    /// Create a page for `title` and return its url
    /// Refuses to overwrite an existing page
    pub fn create_page(&self, title: &str) -> Result<String, String> {
        let name = slug::slugify(title);
        if name.is_empty() {
            return Err(format!("Cannot derive a page name from '{}'", title));
        }

        let path = self.base_path.join(format!("{}.md", name));
        if path.exists() {
            return Err(format!("Page '{}' already exists", name));
        }
        fs::create_dir_all(&self.base_path)
            .map_err(|e| format!("Failed to create directory for '{}': {}", name, e))?;
        fs::write(&path, format!("# {}\n", title))
            .map_err(|e| format!("Failed to save '{}': {}", name, e))?;

        Ok(format!("/{}", name))
    }
}

fn page_title(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn page_result(name: &str) -> SearchResult {
    SearchResult::new(format!("/{}", name), page_title(name), name)
}

/// Simple fuzzy match: subsequence match with light scoring
pub fn fuzzy_score(query: &str, candidate: &str) -> Option<i32> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return Some(0);
    }
    let c = candidate.to_lowercase();
    let qb: Vec<char> = q.chars().collect();
    let mut score = 0i32;
    let mut qi = 0usize;
    let mut prev: Option<char> = None;
    for (i, ch) in c.chars().enumerate() {
        if qi < qb.len() && ch == qb[qi] {
            // Reward matches earlier and consecutive
            score += 10 - (i as i32).min(9);
            // Bonus for start of word or after '/'
            if i == 0 || matches!(prev, Some('/' | ' ' | '-' | '_')) {
                score += 5;
            }
            qi += 1;
            if qi == qb.len() {
                break;
            }
        }
        prev = Some(ch);
    }
    if qi < qb.len() {
        return None;
    }
    // Prefer prefix and exact
    if c.starts_with(&q) {
        score += 20;
    }
    if c == q {
        score += 50;
    }
    Some(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_index(name: &str) -> (PathBuf, PageIndex) {
        let temp_dir = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&temp_dir);
        fs::create_dir_all(&temp_dir).unwrap();
        (temp_dir.clone(), PageIndex::new(temp_dir))
    }

    #[test]
    fn test_fuzzy_score() {
        assert!(fuzzy_score("stp", "standup").is_some());
        assert!(fuzzy_score("xyz", "standup").is_none());
        assert!(fuzzy_score("standup", "standup") > fuzzy_score("stand", "standup"));
        assert!(fuzzy_score("st", "standup") > fuzzy_score("st", "project/list"));
        assert_eq!(fuzzy_score("  ", "anything"), Some(0));
    }

    #[test]
    fn test_list_pages_recursive() {
        let (temp_dir, index) = temp_index("piki-link-test-list");
        fs::write(temp_dir.join("root.md"), "root").unwrap();
        fs::write(temp_dir.join("notes.txt"), "skip").unwrap();
        fs::create_dir_all(temp_dir.join("dir1/subdir")).unwrap();
        fs::write(temp_dir.join("dir1/page1.md"), "page1").unwrap();
        fs::write(temp_dir.join("dir1/subdir/page2.md"), "page2").unwrap();

        let pages = index.list_pages().unwrap();
        assert_eq!(pages, vec!["dir1/page1", "dir1/subdir/page2", "root"]);

        fs::remove_dir_all(&temp_dir).ok();
    }

    #[test]
    fn test_search_ranks_best_first() {
        let (temp_dir, index) = temp_index("piki-link-test-search");
        fs::create_dir_all(temp_dir.join("project")).unwrap();
        fs::write(temp_dir.join("guide.md"), "").unwrap();
        fs::write(temp_dir.join("project/guidelines.md"), "").unwrap();
        fs::write(temp_dir.join("frontpage.md"), "").unwrap();

        let results = index.search("guide").unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], SearchResult::new("/guide", "guide", "guide"));
        assert_eq!(results[1].url, "/project/guidelines");
        assert_eq!(results[1].title, "guidelines");

        fs::remove_dir_all(&temp_dir).ok();
    }

    #[test]
    fn test_create_page() {
        let (temp_dir, index) = temp_index("piki-link-test-create");

        let url = index.create_page("Release Notes 2025").unwrap();
        assert_eq!(url, "/release-notes-2025");
        assert_eq!(
            fs::read_to_string(temp_dir.join("release-notes-2025.md")).unwrap(),
            "# Release Notes 2025\n"
        );
        assert!(index.create_page("Release notes 2025").is_err());
        assert!(index.create_page("!!!").is_err());

        fs::remove_dir_all(&temp_dir).ok();
    }
}
