//! CapiTainS text inventories.
//!
//! A CTS corpus ships one `__cts__.xml` per textgroup and per work. Work
//! inventories list the texts of that work:
//!
//! ```xml
//! <ti:work urn="urn:cts:latinLit:phi0474.phi001" xml:lang="lat">
//!   <ti:edition urn="urn:cts:latinLit:phi0474.phi001.perseus-lat2"/>
//!   <ti:translation urn="urn:cts:latinLit:phi0474.phi001.perseus-eng2" xml:lang="eng"/>
//! </ti:work>
//! ```
//!
//! Each text lives next to its inventory as `<last urn segment>.xml`.

use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::metadata::{DeclaresLanguage, MetadataConvention};

pub const CTS_METADATA_FILE: &str = "__cts__.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Edition,
    Translation,
    Commentary,
}

/// A text declared in a work inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtsText {
    pub urn: String,
    pub kind: TextKind,
    pub language: String,
    pub path: PathBuf,
}

impl CtsText {
    /// Returns true if the text's file is present on disk.
    pub fn is_readable(&self) -> bool {
        self.path.is_file()
    }
}

impl DeclaresLanguage for CtsText {
    fn id(&self) -> &str {
        &self.urn
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn language(&self) -> &str {
        &self.language
    }
}

/// Reads `__cts__.xml` inventories.
#[derive(Debug, Clone, Copy, Default)]
pub struct CtsConvention;

impl MetadataConvention for CtsConvention {
    fn name(&self) -> &str {
        "cts"
    }

    fn is_metadata_file(&self, path: &Path) -> bool {
        path.file_name().is_some_and(|n| n == CTS_METADATA_FILE)
    }

    fn read(&self, metadata_file: &Path) -> Result<Vec<Box<dyn DeclaresLanguage>>, String> {
        let xml = std::fs::read_to_string(metadata_file).map_err(|e| e.to_string())?;
        let dir = metadata_file.parent().unwrap_or(Path::new("."));

        Ok(parse_inventory(&xml, dir)?
            .into_iter()
            .filter(CtsText::is_readable)
            .map(|text| Box::new(text) as Box<dyn DeclaresLanguage>)
            .collect())
    }
}

/// Parse an inventory, resolving text files relative to `dir`.
///
/// Texts with no URN, or with no language of their own and no enclosing
/// work language, are skipped. File existence is not checked.
pub fn parse_inventory(xml: &str, dir: &Path) -> Result<Vec<CtsText>, String> {
    let mut reader = Reader::from_str(xml);
    let mut work_language: Option<String> = None;
    let mut texts = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"work" => work_language = attribute(&e, b"xml:lang")?,
                b"edition" => push_text(&mut texts, &e, TextKind::Edition, &work_language, dir)?,
                b"translation" => {
                    push_text(&mut texts, &e, TextKind::Translation, &work_language, dir)?
                }
                b"commentary" => {
                    push_text(&mut texts, &e, TextKind::Commentary, &work_language, dir)?
                }
                _ => {}
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"work" => work_language = None,
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "XML error at byte {}: {e}",
                    reader.error_position()
                ));
            }
            _ => {}
        }
    }

    Ok(texts)
}

fn push_text(
    texts: &mut Vec<CtsText>,
    element: &BytesStart<'_>,
    kind: TextKind,
    work_language: &Option<String>,
    dir: &Path,
) -> Result<(), String> {
    let Some(urn) = attribute(element, b"urn")? else {
        return Ok(());
    };
    let Some(language) = attribute(element, b"xml:lang")?.or_else(|| work_language.clone())
    else {
        tracing::debug!(%urn, "text declares no language");
        return Ok(());
    };

    let file_stem = urn.rsplit(':').next().unwrap_or(&urn);
    let path = dir.join(format!("{file_stem}.xml"));

    texts.push(CtsText {
        urn,
        kind,
        language,
        path,
    });
    Ok(())
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, String> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.as_ref() == key {
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            let value = value.trim();
            return Ok((!value.is_empty()).then(|| value.to_owned()));
        }
    }
    Ok(None)
}
