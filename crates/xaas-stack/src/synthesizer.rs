//! Resource synthesis: the store, then one backing resource per item.
//!
//! Names derive from the stack and the item key only, so re-running
//! against unchanged content declares identical names.

use serde_json::{Map, Value};
use xaas_common::constants;
use xaas_common::error::{Result, XaasError};
use xaas_common::types::ResourceName;
use xaas_content::{ContentItem, ContentKey, Payload};
use xaas_graph::{Declaration, Input, Output, ResourceHandle, ResourceKind};

use crate::context::BuildContext;
use crate::descriptor::{Backing, StackDescriptor};

const BUCKET_ID_PLACEHOLDER: &str = "{id}";

const PUBLIC_READ_POLICY: &str = r#"{
  "Version": "2012-10-17",
  "Statement": [
    {
      "Effect": "Allow",
      "Principal": "*",
      "Action": ["s3:GetObject"],
      "Resource": ["arn:aws:s3:::{id}/*"]
    }
  ]
}"#;

/// A declared store and the value functions use to address it.
#[derive(Debug, Clone)]
pub struct BackingStore {
    /// The table or bucket.
    pub handle: ResourceHandle,
    /// Physical name, resolved later.
    pub physical_name: Output,
}

/// Declares the store backing `stack`.
///
/// A table is declared alone. A bucket is followed by a permissive
/// public-access block and a public-read policy that depends on it.
///
/// # Errors
///
/// Returns [`XaasError::ResourceCreation`] if any declaration is rejected.
pub fn declare_store(ctx: &mut BuildContext<'_>, stack: &StackDescriptor) -> Result<BackingStore> {
    let handle = match &stack.backing {
        Backing::Table { hash_key, key_type } => {
            let name = stack.store_name(&ctx.config().acronym);
            ctx.declare(
                Declaration::new(ResourceKind::Table, name)
                    .arg(
                        "attributes",
                        vec![Input::map([("name", hash_key.as_str()), ("type", key_type.as_str())])],
                    )
                    .arg("hashKey", hash_key.as_str())
                    .arg("billingMode", "PROVISIONED")
                    .arg("readCapacity", constants::TABLE_CAPACITY)
                    .arg("writeCapacity", constants::TABLE_CAPACITY),
            )?
        }
        Backing::PublicBucket { label } => {
            let bucket_name = stack.store_name(&ctx.config().acronym);
            declare_public_bucket(ctx, label, bucket_name)?
        }
    };
    let physical_name = handle.attr(stack.backing.name_attribute());
    Ok(BackingStore {
        handle,
        physical_name,
    })
}

fn declare_public_bucket(
    ctx: &mut BuildContext<'_>,
    label: &str,
    bucket_name: ResourceName,
) -> Result<ResourceHandle> {
    let bucket = ctx.declare(Declaration::new(ResourceKind::Bucket, bucket_name.clone()))?;

    let access = ctx.declare(
        Declaration::new(
            ResourceKind::BucketPublicAccessBlock,
            bucket_name.child("publicaccess-allow"),
        )
        .arg("bucket", bucket.id())
        .arg("blockPublicAcls", false)
        .arg("blockPublicPolicy", false)
        .arg("ignorePublicAcls", false)
        .arg("restrictPublicBuckets", false),
    )?;

    let policy = Output::interpolate(PUBLIC_READ_POLICY, BUCKET_ID_PLACEHOLDER, &bucket.id());
    let policy_name = ctx.name(&[label, "policy"]);
    let _ = ctx.declare(
        Declaration::new(ResourceKind::BucketPolicy, policy_name)
            .arg("bucket", bucket.id())
            .arg("policy", policy)
            .depends_on([&access]),
    )?;
    Ok(bucket)
}

/// Declares one backing resource per item, in item order.
///
/// Zero items is not an error; it yields zero resources.
///
/// # Errors
///
/// Returns [`XaasError::Configuration`] if an item cannot be stored in
/// this kind of store, or [`XaasError::ResourceCreation`] if a
/// declaration is rejected.
pub fn synthesize(
    ctx: &mut BuildContext<'_>,
    stack: &StackDescriptor,
    store: &BackingStore,
    items: &[ContentItem],
) -> Result<Vec<ResourceHandle>> {
    let mut handles = Vec::with_capacity(items.len());
    for item in items {
        let declaration = match (&stack.backing, &item.key, &item.payload) {
            (Backing::Table { hash_key, key_type }, ContentKey::Index(i), Payload::Text(text)) => {
                Declaration::new(ResourceKind::TableItem, store.handle.name().child(i.to_string()))
                    .arg("tableName", store.physical_name.clone())
                    .arg("hashKey", store.handle.attr("hashKey"))
                    .arg("item", row_item(hash_key, key_type, *i, text)?)
            }
            (Backing::PublicBucket { .. }, ContentKey::File(file), Payload::File { path, digest }) => {
                Declaration::new(ResourceKind::BucketObject, store.handle.name().child(file))
                    .arg("bucket", store.handle.id())
                    .arg("key", format!("{}{file}", ctx.config().object_key_prefix))
                    .arg("source", path.display().to_string())
                    .arg("sourceHash", digest.as_hex())
                    .arg(
                        "tags",
                        Input::map(item.tags.iter().map(|(k, v)| (k.clone(), v.as_str()))),
                    )
            }
            _ => {
                return Err(XaasError::config(format!(
                    "stack \"{}\": item {} cannot be stored in a {}",
                    stack.name,
                    item.key,
                    stack.backing.store_kind()
                )));
            }
        };
        handles.push(ctx.declare(declaration)?);
    }

    if handles.is_empty() {
        tracing::warn!(stack = %stack.name, "no content items; store will be empty");
    } else {
        tracing::info!(
            stack = %stack.name,
            kind = %stack.backing.item_kind(),
            count = handles.len(),
            "backing resources synthesized"
        );
    }
    Ok(handles)
}

/// Encodes one text line as a row-store item:
/// `{"<hash key>": {"<type>": "<i>"}, "Text": {"S": "<line>"}}`.
fn row_item(hash_key: &str, key_type: &str, index: usize, text: &str) -> Result<String> {
    let mut key = Map::new();
    let _ = key.insert(key_type.to_string(), Value::String(index.to_string()));
    let mut row = Map::new();
    let _ = row.insert(hash_key.to_string(), Value::Object(key));
    let _ = row.insert("Text".to_string(), serde_json::json!({ "S": text }));
    Ok(serde_json::to_string(&Value::Object(row))?)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use xaas_common::config::ProjectConfig;
    use xaas_common::types::Sha256Hash;
    use xaas_content::Tags;
    use xaas_graph::RecordingProvisioner;

    use super::*;
    use crate::descriptor::{facts_stack, images_stack, pats_stack};

    fn config() -> ProjectConfig {
        ProjectConfig::derive("cat", Path::new("/proj"))
    }

    fn file_item(name: &str, tags: &[(&str, &str)]) -> ContentItem {
        ContentItem {
            key: ContentKey::File(name.into()),
            payload: Payload::File {
                path: format!("/proj/assets/animals/cat/images/{name}").into(),
                digest: Sha256Hash::digest(name.as_bytes()),
            },
            tags: tags
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect::<Tags>(),
        }
    }

    #[test]
    fn row_item_escapes_text() {
        let row = row_item("FactId", "N", 2, r#"Cats say "meow""#).expect("encode");
        let parsed: Value = serde_json::from_str(&row).expect("json");
        assert_eq!(parsed["FactId"]["N"], "2");
        assert_eq!(parsed["Text"]["S"], r#"Cats say "meow""#);
    }

    #[test]
    fn table_rows_follow_line_order() {
        let config = config();
        let mut p = RecordingProvisioner::new();
        let mut ctx = BuildContext::new(&config, &mut p);
        let stack = facts_stack();
        let store = declare_store(&mut ctx, &stack).expect("store");
        let items: Vec<_> = ["A", "B", "C"]
            .iter()
            .enumerate()
            .map(|(i, t)| ContentItem::line(i, *t))
            .collect();
        let rows = synthesize(&mut ctx, &stack, &store, &items).expect("rows");
        let names: Vec<_> = rows.iter().map(|h| h.name().as_str()).collect();
        assert_eq!(names, vec!["caas-ddb-facts-0", "caas-ddb-facts-1", "caas-ddb-facts-2"]);
        let bundle = ctx.into_bundle();
        assert_eq!(bundle.count(ResourceKind::Table), 1);
        assert_eq!(bundle.count(ResourceKind::TableItem), 3);
    }

    #[test]
    fn bucket_declares_access_block_and_policy() {
        let config = config();
        let mut p = RecordingProvisioner::new();
        let mut ctx = BuildContext::new(&config, &mut p);
        let store = declare_store(&mut ctx, &images_stack()).expect("store");
        assert_eq!(store.handle.name().as_str(), "caas-s3-assets");
        drop(ctx);

        let policy = p
            .of_kind(ResourceKind::BucketPolicy)
            .next()
            .expect("policy declared");
        assert_eq!(policy.name.as_str(), "caas-assets-policy");
        let access = p
            .of_kind(ResourceKind::BucketPublicAccessBlock)
            .next()
            .expect("access block");
        assert_eq!(access.name.as_str(), "caas-s3-assets-publicaccess-allow");
        assert!(p.graph().depends_on(&policy.urn(), &access.urn()));
        let document = p
            .resolve(policy.args["policy"].as_output().expect("lazy policy"))
            .expect("resolve");
        assert!(document.contains("arn:aws:s3:::caas-s3-assets_id/*"), "{document}");
    }

    #[test]
    fn objects_carry_key_tags_and_digest() {
        let config = config();
        let mut p = RecordingProvisioner::new();
        let mut ctx = BuildContext::new(&config, &mut p);
        let stack = images_stack();
        let store = declare_store(&mut ctx, &stack).expect("store");
        let items = vec![file_item("Tabby.JPG", &[("breed", "tabby")]), file_item("b.png", &[])];
        let objects = synthesize(&mut ctx, &stack, &store, &items).expect("objects");
        assert_eq!(objects[0].name().as_str(), "caas-s3-assets-tabby.jpg");
        drop(ctx);

        let first = p.get(objects[0].urn()).expect("declared");
        assert_eq!(
            first.args["key"].as_str(),
            Some("assets/animals/cat/images/Tabby.JPG")
        );
        assert_eq!(
            first.args["tags"].get("breed").and_then(Input::as_str),
            Some("tabby")
        );
        assert_eq!(
            first.args["sourceHash"].as_str(),
            Some(Sha256Hash::digest(b"Tabby.JPG").as_hex())
        );
        let second = p.get(objects[1].urn()).expect("declared");
        assert_eq!(second.args["tags"], Input::map(Vec::<(String, Input)>::new()));
    }

    #[test]
    fn empty_content_yields_no_resources() {
        let config = config();
        let mut p = RecordingProvisioner::new();
        let mut ctx = BuildContext::new(&config, &mut p);
        let stack = pats_stack();
        let store = declare_store(&mut ctx, &stack).expect("store");
        assert!(synthesize(&mut ctx, &stack, &store, &[]).expect("ok").is_empty());
        assert_eq!(store.handle.name().as_str(), "caas-ddb-pats");
    }

    #[test]
    fn mismatched_item_is_rejected() {
        let config = config();
        let mut p = RecordingProvisioner::new();
        let mut ctx = BuildContext::new(&config, &mut p);
        let stack = facts_stack();
        let store = declare_store(&mut ctx, &stack).expect("store");
        let err = synthesize(&mut ctx, &stack, &store, &[file_item("x.jpg", &[])])
            .expect_err("mismatch");
        assert!(matches!(err, XaasError::Configuration { .. }));
    }

    #[test]
    fn duplicate_sanitized_file_names_are_rejected() {
        let config = config();
        let mut p = RecordingProvisioner::new();
        let mut ctx = BuildContext::new(&config, &mut p);
        let stack = images_stack();
        let store = declare_store(&mut ctx, &stack).expect("store");
        let items = vec![file_item("a b.jpg", &[]), file_item("a_b.jpg", &[])];
        let err = synthesize(&mut ctx, &stack, &store, &items).expect_err("collision");
        assert!(matches!(err, XaasError::ResourceCreation { .. }));
    }
}
