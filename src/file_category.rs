/// File categorization by extension.
///
/// This module maps file extensions to the category folders files are moved
/// into. The mapping is an ordered table: when an extension is listed under more
/// than one category, the category declared first wins.
///
/// # Examples
///
/// ```
/// use tidywatch::file_category::{Category, Classifier};
///
/// let classifier = Classifier::default();
/// assert_eq!(classifier.classify(".JPG"), Category::Images);
/// assert_eq!(classifier.classify(".pdf"), Category::Documents);
/// assert_eq!(classifier.classify(".xyz"), Category::Other);
/// ```
use std::collections::HashSet;
use std::fmt;

/// Represents a destination category.
///
/// Folder names are stable: other tooling may rely on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Image files (JPG, PNG, HEIC, etc.)
    Images,
    /// Documents, spreadsheets and presentations
    Documents,
    /// Video files (MP4, MKV, MOV, etc.)
    Videos,
    /// Audio files (MP3, FLAC, WAV, etc.)
    Audio,
    /// Archives and disk images
    Archives,
    /// Source code
    Code,
    /// Installers, binaries and scripts
    Executables,
    /// Font files
    Fonts,
    /// 3D model files
    ThreeDModels,
    /// CAD drawings and parts
    Cad,
    /// Database files
    Database,
    /// Anything with no table entry
    Other,
}

impl Category {
    /// Every category, in folder-creation order. `Other` is always last.
    pub const ALL: [Category; 12] = [
        Category::Images,
        Category::Documents,
        Category::Videos,
        Category::Audio,
        Category::Archives,
        Category::Code,
        Category::Executables,
        Category::Fonts,
        Category::ThreeDModels,
        Category::Cad,
        Category::Database,
        Category::Other,
    ];

    /// Returns the folder name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use tidywatch::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "Images");
    /// assert_eq!(Category::ThreeDModels.dir_name(), "3D_Models");
    /// assert_eq!(Category::Other.dir_name(), "Other");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Documents => "Documents",
            Category::Videos => "Videos",
            Category::Audio => "Audio",
            Category::Archives => "Archives",
            Category::Code => "Code",
            Category::Executables => "Executables",
            Category::Fonts => "Fonts",
            Category::ThreeDModels => "3D_Models",
            Category::Cad => "CAD",
            Category::Database => "Database",
            Category::Other => "Other",
        }
    }

    /// Looks up a category by its folder name (exact match).
    pub fn from_dir_name(name: &str) -> Option<Category> {
        Self::ALL.into_iter().find(|c| c.dir_name() == name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

// Order is priority. Overlaps: .svg Images>Fonts, .dmg/.pkg Archives>Executables,
// .py Code>Executables, .ts Videos>Code.
const BUILTIN: &[(Category, &[&str])] = &[
    (
        Category::Images,
        &[
            ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".tif", ".svg", ".webp", ".ico",
            ".raw", ".heic",
        ],
    ),
    (
        Category::Documents,
        &[
            ".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt", ".pages", ".md", ".tex", ".csv",
            ".xls", ".xlsx", ".ppt", ".pptx", ".odp", ".ods",
        ],
    ),
    (
        Category::Videos,
        &[
            ".mp4", ".avi", ".mov", ".wmv", ".flv", ".webm", ".mkv", ".m4v", ".3gp", ".ogv",
            ".ts", ".mts", ".m2ts",
        ],
    ),
    (
        Category::Audio,
        &[
            ".mp3", ".wav", ".flac", ".aac", ".ogg", ".wma", ".m4a", ".opus", ".aiff", ".alac",
        ],
    ),
    (
        Category::Archives,
        &[
            ".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz", ".iso", ".dmg", ".pkg",
        ],
    ),
    (
        Category::Code,
        &[
            ".py", ".js", ".html", ".css", ".java", ".cpp", ".c", ".h", ".php", ".rb", ".go",
            ".rs", ".swift", ".kt", ".ts", ".jsx", ".tsx", ".vue", ".svelte",
        ],
    ),
    (
        Category::Executables,
        &[
            ".exe", ".msi", ".app", ".dmg", ".deb", ".rpm", ".pkg", ".bat", ".cmd", ".sh", ".py",
            ".jar",
        ],
    ),
    (
        Category::Fonts,
        &[".ttf", ".otf", ".woff", ".woff2", ".eot", ".svg"],
    ),
    (
        Category::ThreeDModels,
        &[
            ".obj", ".fbx", ".dae", ".3ds", ".blend", ".max", ".ma", ".mb", ".stl", ".ply",
            ".wrl",
        ],
    ),
    (
        Category::Cad,
        &[
            ".dwg", ".dxf", ".step", ".stp", ".iges", ".igs", ".sldprt", ".sldasm", ".prt",
            ".asm",
        ],
    ),
    (
        Category::Database,
        &[
            ".db", ".sqlite", ".sql", ".mdb", ".accdb", ".odb", ".fdb", ".db3",
        ],
    ),
];

/// Ordered collection of (category, extension set) pairs.
///
/// Extensions are stored lower-cased with their leading dot.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    entries: Vec<(Category, HashSet<String>)>,
}

impl CategoryTable {
    /// The built-in desktop table.
    pub fn builtin() -> Self {
        Self::from_entries(BUILTIN.iter().map(|(category, exts)| (*category, *exts)))
    }

    /// Builds a table from ordered entries. Extensions may be given with or
    /// without the leading dot and in any case.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Category, &'a [&'a str])>,
    {
        let entries = entries
            .into_iter()
            .map(|(category, exts)| {
                let set = exts.iter().map(|ext| normalize_extension(ext)).collect();
                (category, set)
            })
            .collect();
        Self { entries }
    }

    /// Returns the first category whose set contains `normalized`.
    fn lookup(&self, normalized: &str) -> Option<Category> {
        self.entries
            .iter()
            .find(|(_, exts)| exts.contains(normalized))
            .map(|(category, _)| *category)
    }

    /// Categories in declaration order.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.entries.iter().map(|(category, _)| *category)
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Lower-cases an extension and gives it a leading dot. Empty stays empty.
fn normalize_extension(ext: &str) -> String {
    let lower = ext.to_lowercase();
    if lower.is_empty() || lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

/// Maps file extensions to categories using an injected [`CategoryTable`].
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    table: CategoryTable,
}

impl Classifier {
    /// Creates a classifier over the given table.
    pub fn new(table: CategoryTable) -> Self {
        Self { table }
    }

    /// Classifies an extension such as `".JPG"` or `"jpg"`.
    ///
    /// Lookup is case-insensitive and total: anything without a table entry
    /// (including the empty string) is [`Category::Other`].
    ///
    /// # Examples
    ///
    /// ```
    /// use tidywatch::file_category::{Category, Classifier};
    ///
    /// let classifier = Classifier::default();
    /// assert_eq!(classifier.classify(".py"), Category::Code);
    /// assert_eq!(classifier.classify(""), Category::Other);
    /// ```
    pub fn classify(&self, extension: &str) -> Category {
        let normalized = normalize_extension(extension);
        if normalized.is_empty() {
            return Category::Other;
        }
        self.table.lookup(&normalized).unwrap_or(Category::Other)
    }

    /// All categories that need a folder: the table's, then `Other`.
    pub fn categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = Vec::new();
        for category in self.table.categories() {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        if !categories.contains(&Category::Other) {
            categories.push(Category::Other);
        }
        categories
    }

    /// Returns true if `name` is the folder name of one of this classifier's categories.
    pub fn is_category_dir(&self, name: &str) -> bool {
        Category::from_dir_name(name).is_some_and(|c| self.categories().contains(&c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_dir_names() {
        assert_eq!(Category::Images.dir_name(), "Images");
        assert_eq!(Category::Documents.dir_name(), "Documents");
        assert_eq!(Category::Videos.dir_name(), "Videos");
        assert_eq!(Category::Audio.dir_name(), "Audio");
        assert_eq!(Category::Archives.dir_name(), "Archives");
        assert_eq!(Category::Code.dir_name(), "Code");
        assert_eq!(Category::Executables.dir_name(), "Executables");
        assert_eq!(Category::Fonts.dir_name(), "Fonts");
        assert_eq!(Category::ThreeDModels.dir_name(), "3D_Models");
        assert_eq!(Category::Cad.dir_name(), "CAD");
        assert_eq!(Category::Database.dir_name(), "Database");
        assert_eq!(Category::Other.dir_name(), "Other");
    }

    #[test]
    fn test_from_dir_name_round_trips() {
        for category in Category::ALL {
            assert_eq!(Category::from_dir_name(category.dir_name()), Some(category));
        }
        assert_eq!(Category::from_dir_name("images"), None);
    }

    #[test]
    fn test_classify_case_insensitive() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify(".JPG"), Category::Images);
        assert_eq!(classifier.classify(".Jpg"), Category::Images);
        assert_eq!(classifier.classify(".PDF"), Category::Documents);
        assert_eq!(classifier.classify(".Mp3"), Category::Audio);
    }

    #[test]
    fn test_classify_without_leading_dot() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify("png"), Category::Images);
        assert_eq!(classifier.classify("ZIP"), Category::Archives);
    }

    #[test]
    fn test_classify_unknown_defaults_to_other() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify(".xyz"), Category::Other);
        assert_eq!(classifier.classify(""), Category::Other);
        assert_eq!(classifier.classify("."), Category::Other);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let classifier = Classifier::default();
        for (_, exts) in BUILTIN {
            for ext in *exts {
                let first = classifier.classify(ext);
                assert_eq!(first, classifier.classify(ext));
                assert_eq!(first, classifier.classify(&ext.to_uppercase()));
                assert_ne!(first, Category::Other);
            }
        }
    }

    #[test]
    fn test_overlapping_extensions_follow_priority() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify(".py"), Category::Code);
        assert_eq!(classifier.classify(".svg"), Category::Images);
        assert_eq!(classifier.classify(".dmg"), Category::Archives);
        assert_eq!(classifier.classify(".pkg"), Category::Archives);
        assert_eq!(classifier.classify(".ts"), Category::Videos);
    }

    #[test]
    fn test_builtin_covers_every_category() {
        let classifier = Classifier::default();
        assert_eq!(classifier.categories(), Category::ALL.to_vec());
    }

    #[test]
    fn test_custom_table() {
        let table = CategoryTable::from_entries([
            (Category::Code, &["RS", "toml"][..]),
            (Category::Documents, &[".toml"][..]),
        ]);
        let classifier = Classifier::new(table);

        assert_eq!(classifier.classify(".rs"), Category::Code);
        assert_eq!(classifier.classify(".toml"), Category::Code);
        assert_eq!(classifier.classify(".jpg"), Category::Other);
        assert_eq!(
            classifier.categories(),
            vec![Category::Code, Category::Documents, Category::Other]
        );
    }

    #[test]
    fn test_is_category_dir() {
        let classifier = Classifier::default();
        assert!(classifier.is_category_dir("Images"));
        assert!(classifier.is_category_dir("Other"));
        assert!(!classifier.is_category_dir("Downloads"));
    }
}
