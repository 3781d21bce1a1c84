//! Parsing `package.xml` manifests into [`TypeSet`]s.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::domain::errors::{ManifestError, ShapeError};
use crate::domain::model::TypeSet;

const ROOT: &[u8] = b"Package";
const TYPES: &[u8] = b"types";
const MEMBERS: &[u8] = b"members";
const NAME: &[u8] = b"name";

/// Read and parse a manifest from disk.
///
/// The outer error covers IO; the inner one tells the caller whether the document was malformed
/// or merely not shaped like a package manifest.
pub fn read_manifest(path: &Path) -> Result<std::result::Result<TypeSet, ManifestError>> {
    let content =
        fs::read(path).with_context(|| format!("failed to read manifest {}", path.display()))?;
    Ok(parse_manifest(&content))
}

/// Parse raw manifest bytes.
///
/// Namespaces are ignored and surrounding whitespace in text nodes is trimmed. Elements other
/// than `types`, `members` and `name` (for example `version`) are skipped.
pub fn parse_manifest(bytes: &[u8]) -> std::result::Result<TypeSet, ManifestError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ManifestError::NotUtf8)?;
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut parser = ShapeParser::default();
    loop {
        let event = reader.read_event().map_err(|err| ManifestError::MalformedXml {
            position: reader.error_position() as u64,
            message: err.to_string(),
        })?;
        let position = reader.buffer_position() as u64;
        let malformed = |message: &str| ManifestError::MalformedXml {
            position,
            message: message.to_owned(),
        };

        match event {
            Event::Start(start) => {
                if parser.depth() == 0 && parser.root_closed {
                    return Err(malformed("multiple root elements"));
                }
                parser.open(start.local_name().as_ref());
            }
            Event::Empty(empty) => {
                if parser.depth() == 0 && parser.root_closed {
                    return Err(malformed("multiple root elements"));
                }
                parser.open(empty.local_name().as_ref());
                parser.close();
            }
            Event::End(_) => {
                if parser.depth() == 0 {
                    return Err(malformed("unexpected closing tag"));
                }
                parser.close();
            }
            Event::Text(content) => {
                if parser.depth() == 0 {
                    return Err(malformed("text outside of the root element"));
                }
                let value = content.unescape().map_err(|err| ManifestError::MalformedXml {
                    position,
                    message: err.to_string(),
                })?;
                parser.text(&value);
            }
            Event::CData(content) => {
                if parser.depth() == 0 {
                    return Err(malformed("text outside of the root element"));
                }
                parser.text(&String::from_utf8_lossy(&content));
            }
            Event::Eof => break,
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    let position = reader.buffer_position() as u64;
    if parser.depth() != 0 {
        return Err(ManifestError::MalformedXml {
            position,
            message: "unexpected end of document, unclosed elements".into(),
        });
    }
    if !parser.root_closed {
        return Err(ManifestError::MalformedXml {
            position,
            message: "no root element".into(),
        });
    }

    parser.finish().map_err(ManifestError::from)
}

/// Event sink tracking where we are inside `Package/types/*`.
#[derive(Debug, Default)]
struct ShapeParser {
    stack: Vec<Vec<u8>>,
    root_closed: bool,
    block: Option<TypesBlock>,
    text: String,
    types: TypeSet,
    error: Option<ShapeError>,
}

#[derive(Debug, Default)]
struct TypesBlock {
    names: Vec<String>,
    members: Vec<String>,
}

impl ShapeParser {
    fn depth(&self) -> usize {
        self.stack.len()
    }

    fn open(&mut self, name: &[u8]) {
        match self.stack.len() {
            0 if name != ROOT => {
                let root = String::from_utf8_lossy(name).into_owned();
                self.fail(ShapeError::UnexpectedRoot(root));
            }
            1 if name == TYPES && self.in_root() => self.block = Some(TypesBlock::default()),
            _ => {}
        }
        self.text.clear();
        self.stack.push(name.to_vec());
    }

    fn text(&mut self, value: &str) {
        if self.capturing() {
            self.text.push_str(value);
        }
    }

    fn close(&mut self) {
        let capturing = self.capturing();
        let Some(name) = self.stack.pop() else {
            return;
        };

        if capturing {
            let value = std::mem::take(&mut self.text).trim().to_owned();
            if let Some(block) = self.block.as_mut() {
                match name.as_slice() {
                    MEMBERS if !value.is_empty() => block.members.push(value),
                    NAME => block.names.push(value),
                    _ => {}
                }
            }
        }

        match self.stack.len() {
            0 => self.root_closed = true,
            1 if name == TYPES => {
                if let Some(block) = self.block.take() {
                    self.finish_block(block);
                }
            }
            _ => {}
        }
    }

    fn finish_block(&mut self, block: TypesBlock) {
        let mut names = block.names.into_iter();
        let Some(name) = names.next() else {
            return self.fail(ShapeError::MissingName);
        };
        if names.next().is_some() {
            return self.fail(ShapeError::DuplicateName(name));
        }
        if block.members.is_empty() {
            return self.fail(ShapeError::NoMembers(name));
        }

        for member in block.members {
            self.types.add_member(&name, member);
        }
    }

    fn in_root(&self) -> bool {
        self.stack.first().is_some_and(|root| root == ROOT)
    }

    /// Text is only collected for `Package/types/members` and `Package/types/name`.
    fn capturing(&self) -> bool {
        self.stack.len() == 3
            && self.in_root()
            && self.stack[1] == TYPES
            && matches!(self.stack[2].as_slice(), MEMBERS | NAME)
    }

    fn fail(&mut self, error: ShapeError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn finish(self) -> std::result::Result<TypeSet, ShapeError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.types),
        }
    }
}
