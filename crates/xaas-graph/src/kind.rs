//! Resource kinds declared by the stacks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every resource type the orchestrator can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Row store table.
    Table,
    /// One row in a table.
    TableItem,
    /// Object store bucket.
    Bucket,
    /// Public access settings of a bucket.
    BucketPublicAccessBlock,
    /// Access policy of a bucket.
    BucketPolicy,
    /// One stored object.
    BucketObject,
    /// Function execution role.
    Role,
    /// Inline policy attached to a role.
    RolePolicy,
    /// Managed policy attachment on a role.
    RolePolicyAttachment,
    /// Compute function.
    Function,
    /// Aggregate HTTP gateway.
    RestApi,
}

impl ResourceKind {
    /// All kinds, in declaration-phase order.
    pub const ALL: [Self; 11] = [
        Self::Table,
        Self::TableItem,
        Self::Bucket,
        Self::BucketPublicAccessBlock,
        Self::BucketPolicy,
        Self::BucketObject,
        Self::Role,
        Self::RolePolicy,
        Self::RolePolicyAttachment,
        Self::Function,
        Self::RestApi,
    ];

    /// Fully qualified type token understood by the provisioning engine.
    #[must_use]
    pub const fn type_token(self) -> &'static str {
        match self {
            Self::Table => "aws:dynamodb/table:Table",
            Self::TableItem => "aws:dynamodb/tableItem:TableItem",
            Self::Bucket => "aws:s3/bucket:Bucket",
            Self::BucketPublicAccessBlock => {
                "aws:s3/bucketPublicAccessBlock:BucketPublicAccessBlock"
            }
            Self::BucketPolicy => "aws:s3/bucketPolicy:BucketPolicy",
            Self::BucketObject => "aws:s3/bucketObject:BucketObject",
            Self::Role => "aws:iam/role:Role",
            Self::RolePolicy => "aws:iam/rolePolicy:RolePolicy",
            Self::RolePolicyAttachment => "aws:iam/rolePolicyAttachment:RolePolicyAttachment",
            Self::Function => "aws:lambda/function:Function",
            Self::RestApi => "aws-apigateway:index:RestAPI",
        }
    }

    /// Service segment used when forming resource ARNs.
    #[must_use]
    pub const fn service(self) -> &'static str {
        match self {
            Self::Table | Self::TableItem => "dynamodb",
            Self::Bucket
            | Self::BucketPublicAccessBlock
            | Self::BucketPolicy
            | Self::BucketObject => "s3",
            Self::Role | Self::RolePolicy | Self::RolePolicyAttachment => "iam",
            Self::Function => "lambda",
            Self::RestApi => "apigateway",
        }
    }

    /// Parses a type token back into a kind.
    #[must_use]
    pub fn from_type_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.type_token() == token)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = self.type_token();
        let short = token.rsplit(':').next().unwrap_or(token);
        write!(f, "{short}")
    }
}
