//! System-wide constants, naming fragments, and runtime defaults.

/// Application name used in CLI output.
pub const APP_NAME: &str = "xaas";

/// Environment variable consulted for the product line when no explicit
/// value is supplied.
pub const ANIMAL_ENV_VAR: &str = "XAAS_ANIMAL";

/// Configuration key holding the product line in a stack config file.
pub const ANIMAL_CONFIG_KEY: &str = "animal";

/// Suffix appended to the first letter of the animal to form the acronym.
pub const ACRONYM_SUFFIX: &str = "aas";

/// Directory (relative to the project root) holding all external assets.
pub const ASSETS_DIR: &str = "assets";

/// Directory (relative to the assets dir) holding per-animal content.
pub const ANIMALS_DIR: &str = "animals";

/// Directory (relative to the animal dir) holding image content.
pub const IMAGES_DIR: &str = "images";

/// Sidecar metadata file inside the image directory.
pub const IMAGE_METADATA_FILE: &str = "metadata.json";

/// Top-level key of the sidecar metadata mapping.
pub const IMAGE_METADATA_ROOT_KEY: &str = "images";

/// Line-delimited fact file inside the animal directory.
pub const FACTS_FILE: &str = "facts.txt";

/// Directory (relative to the assets dir) holding function sources.
pub const FUNCTIONS_DIR: &str = "lambda";

/// Packaged artifact path relative to a function's source directory.
pub const ARTIFACT_SUFFIX: &str = "bin/main.zip";

/// Function handler entry point.
pub const FUNCTION_HANDLER: &str = "main";

/// Function runtime identifier.
pub const FUNCTION_RUNTIME: &str = "go1.x";

/// Baseline execution policy attached to every function role.
pub const BASELINE_EXECUTION_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

/// Trust policy allowing the function service to assume a role.
pub const ASSUME_ROLE_POLICY: &str = r#"{
  "Version": "2012-10-17",
  "Statement": [{
    "Sid": "",
    "Effect": "Allow",
    "Principal": {
      "Service": "lambda.amazonaws.com"
    },
    "Action": "sts:AssumeRole"
  }]
}"#;

/// Read/write capacity units provisioned for every row table.
pub const TABLE_CAPACITY: u32 = 10;

/// Environment variable naming the fact table.
pub const FACTS_TABLE_ENV: &str = "FACTS_TABLE_NAME";
/// Default fact table name.
pub const FACTS_TABLE_DEFAULT: &str = "xaas-api-facts";

/// Environment variable naming the image bucket.
pub const IMAGES_BUCKET_ENV: &str = "IMAGES_BUCKET_NAME";
/// Default image bucket name.
pub const IMAGES_BUCKET_DEFAULT: &str = "xaas-api-assets";

/// Environment variable holding the image object key prefix.
pub const IMAGES_PREFIX_ENV: &str = "IMAGES_OBJECT_PREFIX";
/// Default image object key prefix.
pub const IMAGES_PREFIX_DEFAULT: &str = "animals/animal/images/";

/// Environment variable naming the token table.
pub const PAT_TABLE_ENV: &str = "PAT_TABLE_NAME";
/// Default token table name.
pub const PAT_TABLE_DEFAULT: &str = "xaas-api-pats";

/// Environment variable holding the acronym used as token prefix.
pub const ACRONYM_ENV: &str = "ACRONYM";
/// Default acronym.
pub const ACRONYM_DEFAULT: &str = "xaas";

/// Number of random characters after the token prefix.
pub const PAT_SUFFIX_LENGTH: usize = 64;

/// Alphabet used for token suffixes.
pub const PAT_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Maximum token generation attempts before giving up.
pub const PAT_MAX_ATTEMPTS: u32 = 16;

/// Public URL template for stored objects: bucket, then key.
pub const OBJECT_URL_PREFIX: &str = "https://";
/// Host suffix of the public object URL.
pub const OBJECT_URL_HOST_SUFFIX: &str = ".s3.amazonaws.com/";
