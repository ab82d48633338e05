//! Search configuration: walk behavior, skip-dir set, and the text-extension
//! heuristic used to decide which files are worth scanning for content.

use std::collections::HashSet;

/// Well-known vendor/build directories pruned at directory entry during a
/// walk, regardless of `.gitignore`.
pub fn default_skip_dirs() -> Vec<String> {
    vec![
        "node_modules".to_string(),
        ".git".to_string(),
        ".hg".to_string(),
        ".svn".to_string(),
        "bin".to_string(),
        "obj".to_string(),
        ".vs".to_string(),
        "packages".to_string(),
        "target".to_string(),
        "build".to_string(),
        "dist".to_string(),
        "__pycache__".to_string(),
        ".venv".to_string(),
        "venv".to_string(),
        ".idea".to_string(),
        ".vscode".to_string(),
        "vendor".to_string(),
    ]
}

/// Extensions treated as text without needing to sniff file contents.
/// Lookup is O(1) via a `HashSet`.
pub fn default_text_extensions() -> HashSet<String> {
    [
        "rs", "toml", "md", "txt", "json", "yaml", "yml", "xml", "html", "htm", "css", "js",
        "jsx", "ts", "tsx", "py", "rb", "go", "java", "kt", "c", "h", "cpp", "cc", "hpp", "cs",
        "sh", "bash", "zsh", "fish", "ps1", "sql", "proto", "graphql", "lock", "cfg", "ini",
        "conf", "env", "gitignore", "dockerfile", "makefile", "gradle", "properties", "csv",
        "tsv", "log",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub skip_dirs: Vec<String>,
    pub text_extensions: HashSet<String>,
    pub follow_symlinks: bool,
    pub respect_gitignore: bool,
    pub include_hidden: bool,
    /// If a file's extension is unrecognized, sniff up to this many bytes
    /// and treat it as text if no NUL byte is found. `0` disables sniffing.
    pub sniff_bytes: usize,
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            skip_dirs: default_skip_dirs(),
            text_extensions: default_text_extensions(),
            follow_symlinks: false,
            respect_gitignore: true,
            include_hidden: false,
            sniff_bytes: 512,
            max_results: 1000,
        }
    }
}

impl SearchConfig {
    pub fn should_skip_dir(&self, name: &str) -> bool {
        self.skip_dirs.iter().any(|d| d == name)
    }

    pub fn is_known_text_extension(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.text_extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }

    pub fn looks_like_text(&self, path: &std::path::Path) -> bool {
        if self.is_known_text_extension(path) {
            return true;
        }
        if self.sniff_bytes == 0 {
            return false;
        }
        sniff_is_text(path, self.sniff_bytes)
    }
}

fn sniff_is_text(path: &std::path::Path, limit: usize) -> bool {
    use std::io::Read;
    let Ok(mut file) = std::fs::File::open(path) else {
        return false;
    };
    let mut buf = vec![0u8; limit];
    let Ok(n) = file.read(&mut buf) else {
        return false;
    };
    !buf[..n].contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_dirs_includes_common_vendor_dirs() {
        let config = SearchConfig::default();
        assert!(config.should_skip_dir("node_modules"));
        assert!(config.should_skip_dir(".git"));
        assert!(!config.should_skip_dir("src"));
    }

    #[test]
    fn recognizes_known_text_extensions() {
        let config = SearchConfig::default();
        assert!(config.is_known_text_extension(std::path::Path::new("main.rs")));
        assert!(!config.is_known_text_extension(std::path::Path::new("photo.png")));
    }
}
