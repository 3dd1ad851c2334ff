//! Dependency lock file parsing
//!
//! This module reads `.terraform.lock.hcl` files into a [`Locks`] value:
//! - A tokenizer and syntax tree for the static HCL subset lock files use
//! - Interpretation of `provider` blocks into [`ProviderLock`] entries
//! - Canonical rendering back to lock-file text

mod lexer;
mod parser;
mod render;

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::domain::{parse_constraints, parse_provider_source, parse_version};
use crate::domain::{ConstraintSet, ProviderAddress, Version};
use crate::error::ParserError;
use parser::{Attribute, Block, Expr, Item};

/// File name Terraform uses for the dependency lock file
pub const LOCK_FILE_NAME: &str = ".terraform.lock.hcl";

/// Locked selection for one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderLock {
    /// Normalized provider address
    pub addr: ProviderAddress,
    /// Selected version
    pub version: Version,
    /// Constraints recorded when the version was selected, if any
    pub version_constraints: Option<ConstraintSet>,
    /// Package checksums, kept verbatim
    pub hashes: Vec<String>,
}

/// Parsed contents of a lock file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locks {
    providers: BTreeMap<ProviderAddress, ProviderLock>,
    overridden_providers: BTreeSet<ProviderAddress>,
    sources: BTreeMap<String, Vec<u8>>,
}

impl Locks {
    /// All locked providers, keyed by address
    pub fn providers(&self) -> &BTreeMap<ProviderAddress, ProviderLock> {
        &self.providers
    }

    /// Lock entry for a single provider
    pub fn provider(&self, addr: &ProviderAddress) -> Option<&ProviderLock> {
        self.providers.get(addr)
    }

    /// Providers marked as overridden during development
    pub fn overridden_providers(&self) -> &BTreeSet<ProviderAddress> {
        &self.overridden_providers
    }

    /// Verbatim text of each provider block, keyed by its raw label
    pub fn sources(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.sources
    }

    /// Returns true if the file locked nothing at all
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty() && self.overridden_providers.is_empty()
    }

    fn contains(&self, addr: &ProviderAddress) -> bool {
        self.providers.contains_key(addr) || self.overridden_providers.contains(addr)
    }
}

/// Load lock-file bytes, rejecting anything that is not UTF-8
pub fn load_locks_bytes(src: &[u8]) -> Result<Locks, ParserError> {
    let text = std::str::from_utf8(src).map_err(|e| {
        ParserError::document(
            "Invalid character encoding",
            format!("The lock file must be valid UTF-8: {}.", e),
        )
    })?;
    load_locks(text)
}

/// Load lock-file text
///
/// The first malformed entry fails the whole load.
pub fn load_locks(src: &str) -> Result<Locks, ParserError> {
    let body = parser::parse(src)?;
    let mut locks = Locks::default();

    for item in body.items {
        match item {
            Item::Block(block) if block.kind == "provider" => {
                decode_provider_block(src, block, &mut locks)?;
            }
            Item::Block(block) if block.kind == "module" => {
                return Err(ParserError::document(
                    "Dependency locks for modules are not yet supported",
                    "Terraform v1.0 only records locks for providers.",
                ));
            }
            Item::Block(block) => {
                return Err(ParserError::document(
                    "Unsupported block type",
                    format!("Blocks of type {:?} are not expected here.", block.kind),
                ));
            }
            Item::Attribute(attr) => {
                return Err(unsupported_argument(&attr));
            }
        }
    }

    debug!(
        providers = locks.providers.len(),
        overridden = locks.overridden_providers.len(),
        "Loaded dependency lock file"
    );
    Ok(locks)
}

fn unsupported_argument(attr: &Attribute) -> ParserError {
    ParserError::document(
        "Unsupported argument",
        format!("An argument named {:?} is not expected here.", attr.name),
    )
}

/// Attribute values of one provider block
#[derive(Default)]
struct ProviderBlockArgs {
    version: Option<String>,
    constraints: Option<String>,
    hashes: Option<Vec<String>>,
    overridden: Option<bool>,
}

fn decode_provider_block(src: &str, block: Block, locks: &mut Locks) -> Result<(), ParserError> {
    let label = match block.labels.as_slice() {
        [label] => label.as_str(),
        [] => {
            return Err(ParserError::document(
                "Missing name for provider",
                "All provider blocks must have 1 label (source address).",
            ))
        }
        [_, extra, ..] => {
            return Err(ParserError::document(
                "Extraneous label for provider",
                format!("Only 1 label (source address) expected, found {:?} as well.", extra),
            ))
        }
    };

    let addr = parse_provider_source(label).map_err(|e| e.in_block(label))?;
    let args = decode_provider_args(&block).map_err(|e| e.in_block(label))?;

    if locks.contains(&addr) {
        return Err(ParserError::duplicate_provider(&addr));
    }

    if args.overridden == Some(true) {
        if let Some(version) = &args.version {
            parse_version(version).map_err(|e| e.in_block(label))?;
        }
        debug!(provider = %addr, "Provider is overridden");
        locks.overridden_providers.insert(addr);
    } else {
        let raw_version = args.version.ok_or_else(|| {
            ParserError::document(
                "Missing required argument",
                "The argument \"version\" is required, but no definition was found.",
            )
            .in_block(label)
        })?;
        let version = parse_version(&raw_version).map_err(|e| e.in_block(label))?;
        let version_constraints = args
            .constraints
            .as_deref()
            .map(parse_constraints)
            .transpose()
            .map_err(|e| e.in_block(label))?;

        debug!(provider = %addr, version = %version, "Locked provider");
        locks.providers.insert(
            addr.clone(),
            ProviderLock {
                addr,
                version,
                version_constraints,
                hashes: args.hashes.unwrap_or_default(),
            },
        );
    }

    locks
        .sources
        .insert(label.to_string(), src.as_bytes()[block.start..block.end].to_vec());
    Ok(())
}

fn decode_provider_args(block: &Block) -> Result<ProviderBlockArgs, ParserError> {
    let mut args = ProviderBlockArgs::default();

    for item in &block.body.items {
        let attr = match item {
            Item::Attribute(attr) => attr,
            Item::Block(nested) => {
                return Err(ParserError::document(
                    "Unsupported block type",
                    format!("Blocks of type {:?} are not expected here.", nested.kind),
                ))
            }
        };

        let duplicate = match attr.name.as_str() {
            "version" => args.version.replace(expect_string(attr)?).is_some(),
            "constraints" => args.constraints.replace(expect_string(attr)?).is_some(),
            "hashes" => args.hashes.replace(expect_string_list(attr)?).is_some(),
            "overridden" => args.overridden.replace(expect_bool(attr)?).is_some(),
            _ => return Err(unsupported_argument(attr)),
        };
        if duplicate {
            return Err(ParserError::document(
                "Duplicate argument",
                format!("The argument {:?} was already set.", attr.name),
            ));
        }
    }

    Ok(args)
}

fn type_error(attr: &Attribute, expected: &str) -> ParserError {
    let detail = match &attr.value {
        Expr::Reference(name) => format!(
            "Variables may not be used here; found {:?} for {:?}.",
            name, attr.name
        ),
        other => format!(
            "The argument {:?} must be {}, not {}.",
            attr.name,
            expected,
            other.type_name()
        ),
    };
    ParserError::document("Incorrect attribute value type", detail)
}

fn expect_string(attr: &Attribute) -> Result<String, ParserError> {
    match &attr.value {
        Expr::Str(s) => Ok(s.clone()),
        _ => Err(type_error(attr, "a string")),
    }
}

fn expect_bool(attr: &Attribute) -> Result<bool, ParserError> {
    match &attr.value {
        Expr::Bool(b) => Ok(*b),
        _ => Err(type_error(attr, "a bool")),
    }
}

fn expect_string_list(attr: &Attribute) -> Result<Vec<String>, ParserError> {
    let Expr::List(items) = &attr.value else {
        return Err(type_error(attr, "a list of strings"));
    };
    items
        .iter()
        .map(|item| match item {
            Expr::Str(s) => Ok(s.clone()),
            _ => Err(ParserError::document(
                "Invalid provider hash string",
                format!("Each hash must be a string, not {}.", item.type_name()),
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Namespace;
    use crate::error::ParseErrorKind;

    const SAMPLE: &str = r#"# This file is maintained automatically by "terraform init".
# Manual edits may be lost in future updates.

provider "registry.terraform.io/hashicorp/aws" {
  version     = "4.67.0"
  constraints = "~> 4.0"
  hashes = [
    "h1:abc=",
    "zh:0123",
  ]
}

provider "registry.terraform.io/hashicorp/null" {
  version = "3.2.1"
}
"#;

    #[test]
    fn test_load_sample() {
        let locks = load_locks(SAMPLE).unwrap();
        assert_eq!(locks.providers().len(), 2);

        let aws = locks.provider(&ProviderAddress::new("hashicorp", "aws")).unwrap();
        assert_eq!(aws.version, Version::new(4, 67, 0));
        assert_eq!(aws.version_constraints.as_ref().unwrap().to_string(), "~> 4.0");
        assert_eq!(aws.hashes, vec!["h1:abc=".to_string(), "zh:0123".to_string()]);

        let null = locks.provider(&ProviderAddress::new("hashicorp", "null")).unwrap();
        assert!(null.version_constraints.is_none());
        assert!(null.hashes.is_empty());
    }

    #[test]
    fn test_sources_keep_block_text() {
        let locks = load_locks(SAMPLE).unwrap();
        let raw = &locks.sources()["registry.terraform.io/hashicorp/null"];
        assert_eq!(
            std::str::from_utf8(raw).unwrap(),
            "provider \"registry.terraform.io/hashicorp/null\" {\n  version = \"3.2.1\"\n}"
        );
    }

    #[test]
    fn test_empty_file() {
        let locks = load_locks("").unwrap();
        assert!(locks.is_empty());
        assert!(locks.sources().is_empty());
    }

    #[test]
    fn test_short_label_is_normalized() {
        let locks = load_locks("provider \"HashiCorp/AWS\" {\n  version = \"1.0.0\"\n}\n").unwrap();
        assert!(locks.provider(&ProviderAddress::new("hashicorp", "aws")).is_some());
        assert!(locks.sources().contains_key("HashiCorp/AWS"));
    }

    #[test]
    fn test_bare_type_gets_unknown_namespace() {
        let locks = load_locks("provider \"aws\" {\n  version = \"1.0.0\"\n}\n").unwrap();
        let addr = locks.providers().keys().next().unwrap();
        assert_eq!(addr.namespace, Namespace::Unknown);
    }

    #[test]
    fn test_malformed_version_fails_whole_load() {
        let src = format!(
            "{}\nprovider \"hashicorp/random\" {{\n  version = \"not-a-version\"\n}}\n",
            SAMPLE
        );
        let err = load_locks(&src).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Version);
        assert_eq!(err.summary, "Invalid provider version number");
        assert!(err.detail.contains("hashicorp/random"));
    }

    #[test]
    fn test_invalid_source_names_block() {
        let err = load_locks("provider \"a/b/c/d\" {\n  version = \"1.0.0\"\n}\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::ProviderSource);
        assert!(err.detail.contains("a/b/c/d"));
    }

    #[test]
    fn test_invalid_constraints() {
        let err = load_locks("provider \"hashicorp/aws\" {\n  version = \"1.0.0\"\n  constraints = \"~>\"\n}\n")
            .unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Constraint);
    }

    #[test]
    fn test_missing_version() {
        let err = load_locks("provider \"hashicorp/aws\" {\n}\n").unwrap_err();
        assert_eq!(err.summary, "Missing required argument");
    }

    #[test]
    fn test_duplicate_provider_after_normalization() {
        let src = "provider \"hashicorp/aws\" {\n  version = \"1.0.0\"\n}\nprovider \"registry.terraform.io/hashicorp/aws\" {\n  version = \"1.0.0\"\n}\n";
        let err = load_locks(src).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DuplicateProvider);
    }

    #[test]
    fn test_overridden_provider() {
        let src = "provider \"hashicorp/aws\" {\n  overridden = true\n}\nprovider \"hashicorp/null\" {\n  version = \"1.0.0\"\n  overridden = false\n}\n";
        let locks = load_locks(src).unwrap();
        assert!(locks
            .overridden_providers()
            .contains(&ProviderAddress::new("hashicorp", "aws")));
        assert!(locks.provider(&ProviderAddress::new("hashicorp", "aws")).is_none());
        assert!(locks.provider(&ProviderAddress::new("hashicorp", "null")).is_some());
    }

    #[test]
    fn test_duplicate_across_overridden() {
        let src = "provider \"hashicorp/aws\" {\n  overridden = true\n}\nprovider \"hashicorp/aws\" {\n  version = \"1.0.0\"\n}\n";
        assert_eq!(
            load_locks(src).unwrap_err().kind,
            ParseErrorKind::DuplicateProvider
        );
    }

    #[test]
    fn test_module_block_not_supported() {
        let err = load_locks("module \"vpc\" {\n}\n").unwrap_err();
        assert_eq!(
            err.summary,
            "Dependency locks for modules are not yet supported"
        );
    }

    #[test]
    fn test_document_errors() {
        for src in [
            "terraform {\n}\n",
            "version = \"1.0.0\"\n",
            "provider {\n  version = \"1.0.0\"\n}\n",
            "provider \"a/b\" \"extra\" {\n  version = \"1.0.0\"\n}\n",
            "provider \"a/b\" {\n  version = \"1.0.0\"\n  version = \"1.0.0\"\n}\n",
            "provider \"a/b\" {\n  version = \"1.0.0\"\n  unknown = 1\n}\n",
            "provider \"a/b\" {\n  version = \"1.0.0\"\n  nested {\n  }\n}\n",
            "provider \"a/b\" {\n  version = 1\n}\n",
            "provider \"a/b\" {\n  version = var\n}\n",
            "provider \"a/b\" {\n  version = \"1.0.0\"\n  hashes = [1]\n}\n",
            "provider \"a/b\" {\n  version = \"1.0.0\"\n  hashes = \"h1:x\"\n}\n",
            "provider \"a/b\" {\n  version = \"${var.v}\"\n}\n",
            "provider \"a/b\" {\n  overridden = \"yes\"\n}\n",
        ] {
            let err = load_locks(src).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::Document, "src {:?}", src);
        }
    }

    #[test]
    fn test_load_bytes_rejects_invalid_utf8() {
        let err = load_locks_bytes(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Document);
        assert!(load_locks_bytes(SAMPLE.as_bytes()).is_ok());
    }

    #[test]
    fn test_line_numbers_in_syntax_errors() {
        let err = load_locks("\n\nprovider \"a/b\" {\n  version = \"1.0.0\n}\n").unwrap_err();
        assert!(err.detail.contains("line 4"), "{}", err.detail);
    }
}
