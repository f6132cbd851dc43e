//! Stack descriptors and the registry the orchestrator iterates.
//!
//! A stack is described entirely by data: where its content comes from,
//! what kind of store backs it, which policy templates its function
//! needs, which environment values the function receives, and which
//! routes it serves. Adding a stack means registering a descriptor.

use std::collections::BTreeMap;

use serde::Serialize;
use xaas_common::config::ProjectConfig;
use xaas_common::constants;
use xaas_common::error::{Result, XaasError};
use xaas_common::types::{HttpMethod, ResourceName};
use xaas_content::ContentSource;
use xaas_graph::{ExpectedCount, ResourceKind};

/// Where a stack's content lives, relative to the animal directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ContentLocation {
    /// A line-delimited text file.
    Lines {
        /// File name relative to the animal directory.
        file: String,
    },
    /// A directory of files with a sidecar metadata file.
    Directory {
        /// Directory name relative to the animal directory.
        dir: String,
    },
    /// No external content.
    None,
}

impl ContentLocation {
    /// Resolves the descriptor into a concrete source for `config`.
    #[must_use]
    pub fn source(&self, config: &ProjectConfig) -> ContentSource {
        match self {
            Self::Lines { file } => ContentSource::Lines {
                path: config.animal_dir.join(file),
            },
            Self::Directory { dir } => ContentSource::Directory {
                path: config.animal_dir.join(dir),
                metadata_file: config.metadata_file.clone(),
            },
            Self::None => ContentSource::None,
        }
    }
}

/// The store that holds a stack's backing resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Backing {
    /// A provisioned row table; each line becomes one row.
    Table {
        /// Hash key attribute name.
        hash_key: String,
        /// Hash key attribute type (`N` or `S`).
        key_type: String,
    },
    /// A publicly readable bucket; each file becomes one object.
    PublicBucket {
        /// Label used in the bucket name (`<acronym>-s3-<label>`).
        label: String,
    },
}

impl Backing {
    /// Kind of the store resource.
    #[must_use]
    pub const fn store_kind(&self) -> ResourceKind {
        match self {
            Self::Table { .. } => ResourceKind::Table,
            Self::PublicBucket { .. } => ResourceKind::Bucket,
        }
    }

    /// Kind of each backing resource.
    #[must_use]
    pub const fn item_kind(&self) -> ResourceKind {
        match self {
            Self::Table { .. } => ResourceKind::TableItem,
            Self::PublicBucket { .. } => ResourceKind::BucketObject,
        }
    }

    /// Attribute of the store that carries its physical name.
    #[must_use]
    pub const fn name_attribute(&self) -> &'static str {
        match self {
            Self::Table { .. } => "name",
            Self::PublicBucket { .. } => "bucket",
        }
    }
}

/// A policy document template with an `{arn}` placeholder for the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyTemplate {
    /// Suffix appended to the function prefix to name the policy.
    pub name_suffix: String,
    /// Document text.
    pub template: String,
}

/// Value bound to a function environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EnvValue {
    /// Physical name of the stack's store, resolved later.
    StoreName,
    /// Object key prefix derived from configuration.
    ObjectKeyPrefix,
    /// Stack acronym.
    Acronym,
    /// Fixed text.
    Literal(String),
}

/// One environment variable of a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvBinding {
    /// Variable name.
    pub key: String,
    /// Bound value.
    pub value: EnvValue,
}

/// One route a stack's function serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServedRoute {
    /// Request path.
    pub path: String,
    /// Request method.
    pub method: HttpMethod,
}

/// Immutable description of one logical stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackDescriptor {
    /// Stack name; also the function's source directory name.
    pub name: String,
    /// Content source.
    pub content: ContentLocation,
    /// Store kind.
    pub backing: Backing,
    /// Policies attached to the function's role.
    pub policies: Vec<PolicyTemplate>,
    /// Function environment.
    pub env: Vec<EnvBinding>,
    /// Served routes.
    pub routes: Vec<ServedRoute>,
}

impl StackDescriptor {
    /// Checks that the content source can feed the store.
    ///
    /// # Errors
    ///
    /// Returns [`XaasError::Configuration`] if the name is empty or the
    /// content source does not match the store kind.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(XaasError::config("stack name must not be empty"));
        }
        match (&self.content, &self.backing) {
            (ContentLocation::Directory { .. }, Backing::Table { .. }) => {
                Err(XaasError::config(format!(
                    "stack \"{}\": a table store needs line content, not a directory",
                    self.name
                )))
            }
            (ContentLocation::Lines { .. }, Backing::PublicBucket { .. }) => {
                Err(XaasError::config(format!(
                    "stack \"{}\": a bucket store needs directory content, not lines",
                    self.name
                )))
            }
            _ => Ok(()),
        }
    }

    /// Logical store name: `<acronym>-ddb-<stack>` for a table,
    /// `<acronym>-s3-<label>` for a bucket.
    #[must_use]
    pub fn store_name(&self, acronym: &str) -> ResourceName {
        match &self.backing {
            Backing::Table { .. } => ResourceName::new(format!("{acronym}-ddb-{}", self.name)),
            Backing::PublicBucket { label } => ResourceName::new(format!("{acronym}-s3-{label}")),
        }
    }

    /// The function environment with every value resolved from `config`
    /// alone. The store is addressed by its logical name.
    #[must_use]
    pub fn local_environment(&self, config: &ProjectConfig) -> BTreeMap<String, String> {
        self.env
            .iter()
            .map(|binding| {
                let value = match &binding.value {
                    EnvValue::StoreName => self.store_name(&config.acronym).to_string(),
                    EnvValue::ObjectKeyPrefix => config.object_key_prefix.clone(),
                    EnvValue::Acronym => config.acronym.clone(),
                    EnvValue::Literal(text) => text.clone(),
                };
                (binding.key.clone(), value)
            })
            .collect()
    }
}

/// Ordered set of stacks to build. Registration order is route order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StackRegistry {
    stacks: Vec<StackDescriptor>,
}

impl StackRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard registry: facts and images, plus pats when requested.
    #[must_use]
    pub fn standard(include_tokens: bool) -> Self {
        let mut stacks = vec![facts_stack(), images_stack()];
        if include_tokens {
            stacks.push(pats_stack());
        }
        Self { stacks }
    }

    /// Appends a stack.
    ///
    /// # Errors
    ///
    /// Returns [`XaasError::Configuration`] if the descriptor is invalid
    /// or a stack with the same name is already registered.
    pub fn register(&mut self, descriptor: StackDescriptor) -> Result<()> {
        descriptor.validate()?;
        if self.get(&descriptor.name).is_some() {
            return Err(XaasError::config(format!(
                "stack \"{}\" is already registered",
                descriptor.name
            )));
        }
        self.stacks.push(descriptor);
        Ok(())
    }

    /// Looks up a stack by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StackDescriptor> {
        self.stacks.iter().find(|s| s.name == name)
    }

    /// Stacks in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &StackDescriptor> {
        self.stacks.iter()
    }

    /// Stack names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.stacks.iter().map(|s| s.name.as_str()).collect()
    }

    /// Number of registered stacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    /// Whether no stack is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Resource counts a complete build of this registry must produce.
    ///
    /// Content-driven kinds are [`ExpectedCount::Dynamic`].
    #[must_use]
    pub fn expected_counts(&self) -> BTreeMap<ResourceKind, ExpectedCount> {
        let mut fixed: BTreeMap<ResourceKind, usize> = BTreeMap::new();
        let mut bump = |kind: ResourceKind, n: usize| *fixed.entry(kind).or_default() += n;
        for stack in &self.stacks {
            match stack.backing {
                Backing::Table { .. } => bump(ResourceKind::Table, 1),
                Backing::PublicBucket { .. } => {
                    bump(ResourceKind::Bucket, 1);
                    bump(ResourceKind::BucketPublicAccessBlock, 1);
                    bump(ResourceKind::BucketPolicy, 1);
                }
            }
            bump(ResourceKind::Role, 1);
            bump(ResourceKind::RolePolicyAttachment, 1);
            bump(ResourceKind::RolePolicy, stack.policies.len());
            bump(ResourceKind::Function, 1);
        }
        bump(ResourceKind::RestApi, 1);

        let mut expected: BTreeMap<ResourceKind, ExpectedCount> = fixed
            .into_iter()
            .map(|(kind, n)| (kind, ExpectedCount::Exactly(n)))
            .collect();
        for stack in self.stacks.iter().filter(|s| s.content != ContentLocation::None) {
            let _ = expected.insert(stack.backing.item_kind(), ExpectedCount::Dynamic);
        }
        expected
    }
}

const FACTS_READ_POLICY: &str = r#"{
  "Version": "2012-10-17",
  "Statement": [
    {
      "Sid": "DescribeQueryScanFactsTable",
      "Effect": "Allow",
      "Action": [
        "dynamodb:DescribeTable",
        "dynamodb:Query",
        "dynamodb:Scan",
        "dynamodb:GetItem"
      ],
      "Resource": "{arn}"
    }
  ]
}"#;

const IMAGES_READ_POLICY: &str = r#"{
  "Version": "2012-10-17",
  "Statement": [
    {
      "Sid": "DescribeImagesBucket",
      "Effect": "Allow",
      "Action": [
        "s3:GetBucketLocation",
        "s3:GetObject",
        "s3:GetObjectTagging",
        "s3:ListBucket"
      ],
      "Resource": [
        "{arn}/*",
        "{arn}"
      ]
    }
  ]
}"#;

const PATS_READ_WRITE_POLICY: &str = r#"{
  "Version": "2012-10-17",
  "Statement": [
    {
      "Sid": "ReadWritePatsTable",
      "Effect": "Allow",
      "Action": [
        "dynamodb:DescribeTable",
        "dynamodb:GetItem",
        "dynamodb:PutItem",
        "dynamodb:DeleteItem"
      ],
      "Resource": "{arn}"
    }
  ]
}"#;

fn env(key: &str, value: EnvValue) -> EnvBinding {
    EnvBinding {
        key: key.to_string(),
        value,
    }
}

fn route(path: &str, method: HttpMethod) -> ServedRoute {
    ServedRoute {
        path: path.to_string(),
        method,
    }
}

/// Fact lookup: one table row per line of the fact file.
#[must_use]
pub fn facts_stack() -> StackDescriptor {
    StackDescriptor {
        name: "facts".into(),
        content: ContentLocation::Lines {
            file: constants::FACTS_FILE.into(),
        },
        backing: Backing::Table {
            hash_key: "FactId".into(),
            key_type: "N".into(),
        },
        policies: vec![PolicyTemplate {
            name_suffix: "ddb-read-policy".into(),
            template: FACTS_READ_POLICY.into(),
        }],
        env: vec![env(constants::FACTS_TABLE_ENV, EnvValue::StoreName)],
        routes: vec![route("/facts", HttpMethod::Get)],
    }
}

/// Random image: one bucket object per file of the image directory.
#[must_use]
pub fn images_stack() -> StackDescriptor {
    StackDescriptor {
        name: "images".into(),
        content: ContentLocation::Directory {
            dir: constants::IMAGES_DIR.into(),
        },
        backing: Backing::PublicBucket {
            label: "assets".into(),
        },
        policies: vec![PolicyTemplate {
            name_suffix: "s3-read-policy".into(),
            template: IMAGES_READ_POLICY.into(),
        }],
        env: vec![
            env(constants::IMAGES_BUCKET_ENV, EnvValue::StoreName),
            env(constants::IMAGES_PREFIX_ENV, EnvValue::ObjectKeyPrefix),
        ],
        routes: vec![route("/images", HttpMethod::Get)],
    }
}

/// Token issuance: an empty token table, filled at runtime.
#[must_use]
pub fn pats_stack() -> StackDescriptor {
    StackDescriptor {
        name: "pats".into(),
        content: ContentLocation::None,
        backing: Backing::Table {
            hash_key: "Pat".into(),
            key_type: "S".into(),
        },
        policies: vec![PolicyTemplate {
            name_suffix: "ddb-readwrite-policy".into(),
            template: PATS_READ_WRITE_POLICY.into(),
        }],
        env: vec![
            env(constants::PAT_TABLE_ENV, EnvValue::StoreName),
            env(constants::ACRONYM_ENV, EnvValue::Acronym),
        ],
        routes: vec![
            route("/pats", HttpMethod::Post),
            route("/pats", HttpMethod::Delete),
        ],
    }
}
