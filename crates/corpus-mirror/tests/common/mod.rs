#![allow(dead_code)]

use std::path::{Path, PathBuf};

use corpus_mirror::{DeclaresLanguage, MetadataConvention};

/// A text to place in a work: URN suffix (e.g. `perseus-lat2`) and language.
pub struct Text<'a> {
    pub version: &'a str,
    pub language: &'a str,
}

pub fn latin(version: &str) -> Text<'_> {
    Text {
        version,
        language: "lat",
    }
}

pub fn text<'a>(version: &'a str, language: &'a str) -> Text<'a> {
    Text { version, language }
}

/// Write a textgroup/work pair in CapiTainS layout under `root/data`.
///
/// Latin texts are declared as editions inheriting the work language; every
/// other language is declared as a translation. Returns the text file paths.
pub fn write_work(root: &Path, group: &str, work: &str, texts: &[Text<'_>]) -> Vec<PathBuf> {
    let group_dir = root.join("data").join(group);
    let work_dir = group_dir.join(work);
    std::fs::create_dir_all(&work_dir).unwrap();

    std::fs::write(
        group_dir.join("__cts__.xml"),
        format!(
            r#"<ti:textgroup xmlns:ti="http://chs.harvard.edu/xmlns/cts" urn="urn:cts:latinLit:{group}">
  <ti:groupname xml:lang="eng">{group}</ti:groupname>
</ti:textgroup>"#
        ),
    )
    .unwrap();

    let mut entries = String::new();
    let mut paths = Vec::new();

    for text in texts {
        let urn = format!("urn:cts:latinLit:{group}.{work}.{}", text.version);
        if text.language == "lat" {
            entries.push_str(&format!(
                "  <ti:edition workUrn=\"urn:cts:latinLit:{group}.{work}\" urn=\"{urn}\">\n    <ti:label xml:lang=\"eng\">Edition</ti:label>\n  </ti:edition>\n"
            ));
        } else {
            entries.push_str(&format!(
                "  <ti:translation workUrn=\"urn:cts:latinLit:{group}.{work}\" urn=\"{urn}\" xml:lang=\"{}\">\n    <ti:label xml:lang=\"eng\">Translation</ti:label>\n  </ti:translation>\n",
                text.language
            ));
        }

        let path = work_dir.join(format!("{group}.{work}.{}.xml", text.version));
        std::fs::write(&path, format!("<TEI><text xml:lang=\"{}\"/></TEI>", text.language))
            .unwrap();
        paths.push(path);
    }

    std::fs::write(
        work_dir.join("__cts__.xml"),
        format!(
            "<ti:work xmlns:ti=\"http://chs.harvard.edu/xmlns/cts\" groupUrn=\"urn:cts:latinLit:{group}\" urn=\"urn:cts:latinLit:{group}.{work}\" xml:lang=\"lat\">\n  <ti:title xml:lang=\"lat\">{work}</ti:title>\n{entries}</ti:work>\n"
        ),
    )
    .unwrap();

    paths
}

/// All regular files under `root` except inventories, sorted.
pub fn text_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect(root, &mut files);
    files.retain(|p| p.file_name().is_some_and(|n| n != "__cts__.xml"));
    files.sort();
    files
}

fn collect(dir: &Path, files: &mut Vec<PathBuf>) {
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(&path, files);
        } else {
            files.push(path);
        }
    }
}

/// Declares documents from `docs.list` files, one `<id> <language> <file>`
/// per line, without checking that the files exist.
pub struct ListConvention;

pub const LIST_FILE: &str = "docs.list";

struct Listed {
    id: String,
    language: String,
    path: PathBuf,
}

impl DeclaresLanguage for Listed {
    fn id(&self) -> &str {
        &self.id
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn language(&self) -> &str {
        &self.language
    }
}

impl MetadataConvention for ListConvention {
    fn name(&self) -> &str {
        "list"
    }

    fn is_metadata_file(&self, path: &Path) -> bool {
        path.file_name().is_some_and(|n| n == LIST_FILE)
    }

    fn read(&self, metadata_file: &Path) -> Result<Vec<Box<dyn DeclaresLanguage>>, String> {
        let contents = std::fs::read_to_string(metadata_file).map_err(|e| e.to_string())?;
        let dir = metadata_file.parent().unwrap();

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let fields: Vec<&str> = line.split_whitespace().collect();
                match fields.as_slice() {
                    [id, language, file] => Ok(Box::new(Listed {
                        id: (*id).to_owned(),
                        language: (*language).to_owned(),
                        path: dir.join(file),
                    }) as Box<dyn DeclaresLanguage>),
                    _ => Err(format!("bad line: {line}")),
                }
            })
            .collect()
    }
}
