//! Resource Specification Catalog
//!
//! Static, read-only table: resource type -> required/optional properties
//! and per-property validators. Validators are pure functions of the value
//! and return `Some(message)` on failure.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::value::PropertyValue;

pub type PropertyValidator = fn(&PropertyValue) -> Option<String>;

/// Closed set of target resource types the catalog describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceType {
    Vpc,
    Subnet,
    SecurityGroup,
    Instance,
    Bucket,
    Function,
    Role,
    DbInstance,
    Table,
    RestApi,
    Topic,
    Queue,
}

impl ResourceType {
    pub const ALL: [ResourceType; 12] = [
        Self::Vpc,
        Self::Subnet,
        Self::SecurityGroup,
        Self::Instance,
        Self::Bucket,
        Self::Function,
        Self::Role,
        Self::DbInstance,
        Self::Table,
        Self::RestApi,
        Self::Topic,
        Self::Queue,
    ];

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Vpc => "AWS::EC2::VPC",
            Self::Subnet => "AWS::EC2::Subnet",
            Self::SecurityGroup => "AWS::EC2::SecurityGroup",
            Self::Instance => "AWS::EC2::Instance",
            Self::Bucket => "AWS::S3::Bucket",
            Self::Function => "AWS::Lambda::Function",
            Self::Role => "AWS::IAM::Role",
            Self::DbInstance => "AWS::RDS::DBInstance",
            Self::Table => "AWS::DynamoDB::Table",
            Self::RestApi => "AWS::ApiGateway::RestApi",
            Self::Topic => "AWS::SNS::Topic",
            Self::Queue => "AWS::SQS::Queue",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.type_name() == name)
    }

    pub fn spec(&self) -> &'static ResourceSpec {
        match self {
            Self::Vpc => &VPC,
            Self::Subnet => &SUBNET,
            Self::SecurityGroup => &SECURITY_GROUP,
            Self::Instance => &INSTANCE,
            Self::Bucket => &BUCKET,
            Self::Function => &FUNCTION,
            Self::Role => &ROLE,
            Self::DbInstance => &DB_INSTANCE,
            Self::Table => &TABLE,
            Self::RestApi => &REST_API,
            Self::Topic => &TOPIC,
            Self::Queue => &QUEUE,
        }
    }
}

/// Catalog lookup by the template's `Type` string.
pub fn lookup(type_name: &str) -> Option<&'static ResourceSpec> {
    ResourceType::from_type_name(type_name).map(|t| t.spec())
}

pub struct ResourceSpec {
    pub resource_type: ResourceType,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub validators: &'static [(&'static str, PropertyValidator)],
}

impl ResourceSpec {
    pub fn is_known(&self, property: &str) -> bool {
        self.required.contains(&property) || self.optional.contains(&property)
    }

    pub fn validator(&self, property: &str) -> Option<PropertyValidator> {
        self.validators
            .iter()
            .find(|(name, _)| *name == property)
            .map(|(_, validator)| *validator)
    }

    /// Run the property's validator. Intrinsic values are resolved at
    /// deploy time and are never checked here.
    pub fn check(&self, property: &str, value: &PropertyValue) -> Option<String> {
        if value.is_intrinsic() {
            return None;
        }
        self.validator(property).and_then(|validate| validate(value))
    }
}

/// Inclusive numeric bounds shared by validators and the generator's clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: i64,
    pub max: i64,
}

impl Bounds {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: i64) -> i64 {
        value.max(self.min).min(self.max)
    }

    fn check(&self, property: &str, value: &PropertyValue) -> Option<String> {
        let Some(number) = value.as_f64() else {
            return Some(format!("{} must be a number", property));
        };
        if number.fract() != 0.0 {
            return Some(format!("{} must be a whole number, got {}", property, number));
        }
        if number < self.min as f64 || number > self.max as f64 {
            return Some(format!(
                "{} must be between {} and {}, got {}",
                property, self.min, self.max, number
            ));
        }
        None
    }
}

pub const LAMBDA_MEMORY: Bounds = Bounds::new(128, 10240);
pub const LAMBDA_TIMEOUT: Bounds = Bounds::new(1, 900);
pub const RDS_STORAGE: Bounds = Bounds::new(20, 65536);
pub const RDS_BACKUP_RETENTION: Bounds = Bounds::new(0, 35);
pub const SQS_VISIBILITY_TIMEOUT: Bounds = Bounds::new(0, 43200);
pub const SQS_RETENTION_PERIOD: Bounds = Bounds::new(60, 1_209_600);
pub const SQS_DELAY: Bounds = Bounds::new(0, 900);
pub const SQS_MESSAGE_SIZE: Bounds = Bounds::new(1024, 262_144);
pub const SQS_RECEIVE_WAIT: Bounds = Bounds::new(0, 20);
pub const IAM_SESSION_DURATION: Bounds = Bounds::new(3600, 43200);
pub const DYNAMODB_CAPACITY: Bounds = Bounds::new(1, 40000);
pub const NETWORK_PORT: Bounds = Bounds::new(0, 65535);

/// Defaults the generator falls back to when an attribute is absent.
pub mod defaults {
    pub const VPC_CIDR: &str = "10.0.0.0/16";
    pub const SUBNET_CIDR: &str = "10.0.1.0/24";
    pub const INSTANCE_TYPE: &str = "t3.micro";
    pub const IMAGE_ID: &str = "ami-0c02fb55956c7d316";
    pub const LAMBDA_RUNTIME: &str = "nodejs20.x";
    pub const LAMBDA_HANDLER: &str = "index.handler";
    pub const LAMBDA_MEMORY: i64 = 128;
    pub const LAMBDA_TIMEOUT: i64 = 3;
    pub const LAMBDA_INLINE_CODE: &str =
        "exports.handler = async () => ({ statusCode: 200, body: 'ok' });";
    pub const DB_INSTANCE_CLASS: &str = "db.t3.micro";
    pub const DB_ENGINE: &str = "mysql";
    pub const DB_MASTER_USERNAME: &str = "admin";
    pub const DB_ALLOCATED_STORAGE: i64 = 20;
    pub const DB_BACKUP_RETENTION: i64 = 7;
    pub const DYNAMODB_PARTITION_KEY: &str = "id";
    pub const DYNAMODB_BILLING_MODE: &str = "PAY_PER_REQUEST";
    pub const DYNAMODB_CAPACITY: i64 = 5;
    pub const SQS_VISIBILITY_TIMEOUT: i64 = 30;
    pub const SQS_RETENTION_PERIOD: i64 = 345_600;
    pub const SNS_KMS_KEY: &str = "alias/aws/sns";
    pub const ROLE_SERVICE: &str = "ec2.amazonaws.com";
    pub const LAMBDA_BASIC_EXECUTION_POLICY: &str =
        "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";
}

pub const LAMBDA_RUNTIMES: &[&str] = &[
    "nodejs18.x",
    "nodejs20.x",
    "nodejs22.x",
    "python3.9",
    "python3.10",
    "python3.11",
    "python3.12",
    "python3.13",
    "java11",
    "java17",
    "java21",
    "dotnet8",
    "ruby3.2",
    "ruby3.3",
    "provided.al2",
    "provided.al2023",
];

pub const DB_ENGINES: &[&str] = &[
    "mysql",
    "mariadb",
    "postgres",
    "aurora-mysql",
    "aurora-postgresql",
    "oracle-ee",
    "oracle-se2",
    "sqlserver-ee",
    "sqlserver-se",
    "sqlserver-ex",
    "sqlserver-web",
];

lazy_static! {
    static ref CIDR: Regex = Regex::new(r"^\d{1,3}(\.\d{1,3}){3}/\d{1,2}$").unwrap();
    static ref IPV4: Regex = Regex::new(r"^\d{1,3}(\.\d{1,3}){3}$").unwrap();
    static ref BUCKET_CHARSET: Regex = Regex::new(r"^[a-z0-9][a-z0-9.-]*[a-z0-9]$").unwrap();
    static ref INSTANCE_TYPE: Regex = Regex::new(r"^[a-z][a-z0-9-]*\.[a-z0-9]+$").unwrap();
    static ref TOPIC_NAME: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,256}(\.fifo)?$").unwrap();
}

// --- Validators ---

fn one_of(property: &str, value: &PropertyValue, allowed: &[&str]) -> Option<String> {
    match value.as_str() {
        Some(s) if allowed.contains(&s) => None,
        Some(s) => Some(format!(
            "{} '{}' is not one of: {}",
            property,
            s,
            allowed.join(", ")
        )),
        None => Some(format!("{} must be a string", property)),
    }
}

pub fn validate_cidr_block(value: &PropertyValue) -> Option<String> {
    let Some(cidr) = value.as_str() else {
        return Some("CidrBlock must be a string".to_string());
    };
    if !CIDR.is_match(cidr) {
        return Some(format!("Invalid CIDR block format: {}", cidr));
    }
    let (address, prefix) = cidr.split_once('/')?;
    let octets_ok = address.split('.').all(|o| o.parse::<u16>().map_or(false, |n| n <= 255));
    let prefix_ok = prefix.parse::<u8>().map_or(false, |p| p <= 32);
    if !octets_ok || !prefix_ok {
        return Some(format!("CIDR block out of range: {}", cidr));
    }
    None
}

pub fn validate_instance_tenancy(value: &PropertyValue) -> Option<String> {
    one_of("InstanceTenancy", value, &["default", "dedicated", "host"])
}

pub fn validate_boolean(value: &PropertyValue) -> Option<String> {
    match value.as_bool() {
        Some(_) => None,
        None => Some("Value must be a boolean".to_string()),
    }
}

pub fn validate_group_description(value: &PropertyValue) -> Option<String> {
    match value.as_str() {
        Some("") => Some("GroupDescription must not be empty".to_string()),
        Some(s) if s.chars().count() > 255 => {
            Some("GroupDescription must be 255 characters or fewer".to_string())
        }
        Some(_) => None,
        None => Some("GroupDescription must be a string".to_string()),
    }
}

pub fn validate_ingress_rules(value: &PropertyValue) -> Option<String> {
    let Some(rules) = value.as_list() else {
        return Some("SecurityGroupIngress must be a list of rules".to_string());
    };
    for (index, rule) in rules.iter().enumerate() {
        if rule.is_intrinsic() {
            continue;
        }
        let Some(map) = rule.as_map() else {
            return Some(format!("Ingress rule {} must be an object", index));
        };
        let Some(protocol) = ingress_protocol(rule) else {
            return Some(format!("Ingress rule {} is missing IpProtocol", index));
        };
        // -1 means "every port" for all-traffic and ICMP rules
        let wildcard_ports = matches!(protocol.as_str(), "-1" | "icmp" | "icmpv6");
        for port in ["FromPort", "ToPort"] {
            let Some(value) = map.get(port) else {
                continue;
            };
            if wildcard_ports && value.as_i64() == Some(-1) {
                continue;
            }
            if let Some(message) = NETWORK_PORT.check(port, value) {
                return Some(format!("Ingress rule {}: {}", index, message));
            }
        }
    }
    None
}

/// Lower-cased `IpProtocol` of an ingress rule; numeric protocols read as
/// their decimal form.
pub fn ingress_protocol(rule: &PropertyValue) -> Option<String> {
    match rule.get("IpProtocol")? {
        PropertyValue::String(s) => Some(s.to_ascii_lowercase()),
        other => other.as_i64().map(|n| n.to_string()),
    }
}

pub fn validate_bucket_name(value: &PropertyValue) -> Option<String> {
    let Some(name) = value.as_str() else {
        return Some("BucketName must be a string".to_string());
    };
    if name.len() < 3 || name.len() > 63 {
        return Some(format!("Bucket name must be 3-63 characters, got {}", name.len()));
    }
    if !BUCKET_CHARSET.is_match(name) {
        return Some(
            "Bucket name may only contain lowercase letters, digits, dots and hyphens, \
             and must begin and end with a letter or digit"
                .to_string(),
        );
    }
    if name.contains("..") {
        return Some("Bucket name must not contain adjacent periods".to_string());
    }
    if IPV4.is_match(name) {
        return Some("Bucket name must not be formatted as an IP address".to_string());
    }
    if name.starts_with("xn--") || name.ends_with("-s3alias") {
        return Some("Bucket name uses a reserved prefix or suffix".to_string());
    }
    None
}

pub fn validate_versioning(value: &PropertyValue) -> Option<String> {
    match value.get("Status") {
        Some(status) => one_of("VersioningConfiguration.Status", status, &["Enabled", "Suspended"]),
        None => Some("VersioningConfiguration requires Status".to_string()),
    }
}

pub fn validate_runtime(value: &PropertyValue) -> Option<String> {
    one_of("Runtime", value, LAMBDA_RUNTIMES)
}

pub fn validate_memory_size(value: &PropertyValue) -> Option<String> {
    LAMBDA_MEMORY.check("MemorySize", value)
}

pub fn validate_timeout(value: &PropertyValue) -> Option<String> {
    LAMBDA_TIMEOUT.check("Timeout", value)
}

pub fn validate_handler(value: &PropertyValue) -> Option<String> {
    match value.as_str() {
        Some("") => Some("Handler must not be empty".to_string()),
        Some(h) if h.chars().any(char::is_whitespace) => {
            Some(format!("Handler must not contain whitespace: '{}'", h))
        }
        Some(_) => None,
        None => Some("Handler must be a string".to_string()),
    }
}

pub fn validate_code(value: &PropertyValue) -> Option<String> {
    let Some(code) = value.as_map() else {
        return Some("Code must be an object".to_string());
    };
    let has_s3 = code.contains_key("S3Bucket") && code.contains_key("S3Key");
    if has_s3 || code.contains_key("ZipFile") || code.contains_key("ImageUri") {
        None
    } else {
        Some("Code must specify S3Bucket and S3Key, ZipFile, or ImageUri".to_string())
    }
}

pub fn validate_policy_document(value: &PropertyValue) -> Option<String> {
    match value.get("Statement") {
        Some(PropertyValue::List(_)) | Some(PropertyValue::Map(_)) => None,
        _ => Some("Policy document requires a Statement".to_string()),
    }
}

pub fn validate_session_duration(value: &PropertyValue) -> Option<String> {
    IAM_SESSION_DURATION.check("MaxSessionDuration", value)
}

pub fn validate_db_instance_class(value: &PropertyValue) -> Option<String> {
    match value.as_str() {
        Some(class) if class.starts_with("db.") => None,
        Some(class) => Some(format!("DBInstanceClass must start with 'db.', got '{}'", class)),
        None => Some("DBInstanceClass must be a string".to_string()),
    }
}

pub fn validate_engine(value: &PropertyValue) -> Option<String> {
    one_of("Engine", value, DB_ENGINES)
}

pub fn validate_allocated_storage(value: &PropertyValue) -> Option<String> {
    RDS_STORAGE.check("AllocatedStorage", value)
}

pub fn validate_backup_retention(value: &PropertyValue) -> Option<String> {
    RDS_BACKUP_RETENTION.check("BackupRetentionPeriod", value)
}

pub fn validate_port(value: &PropertyValue) -> Option<String> {
    NETWORK_PORT.check("Port", value)
}

pub fn validate_billing_mode(value: &PropertyValue) -> Option<String> {
    one_of("BillingMode", value, &["PROVISIONED", "PAY_PER_REQUEST"])
}

pub fn validate_key_schema(value: &PropertyValue) -> Option<String> {
    let Some(keys) = value.as_list() else {
        return Some("KeySchema must be a list".to_string());
    };
    if keys.is_empty() || keys.len() > 2 {
        return Some(format!("KeySchema must have 1 or 2 elements, got {}", keys.len()));
    }
    for key in keys {
        if key.get("AttributeName").and_then(PropertyValue::as_str).is_none() {
            return Some("KeySchema element is missing AttributeName".to_string());
        }
        if let Some(message) = key
            .get("KeyType")
            .map(|t| one_of("KeyType", t, &["HASH", "RANGE"]))
            .unwrap_or_else(|| Some("KeySchema element is missing KeyType".to_string()))
        {
            return Some(message);
        }
    }
    None
}

pub fn validate_attribute_definitions(value: &PropertyValue) -> Option<String> {
    let Some(definitions) = value.as_list() else {
        return Some("AttributeDefinitions must be a list".to_string());
    };
    for definition in definitions {
        if definition.get("AttributeName").and_then(PropertyValue::as_str).is_none() {
            return Some("AttributeDefinitions element is missing AttributeName".to_string());
        }
        match definition.get("AttributeType") {
            Some(t) => {
                if let Some(message) = one_of("AttributeType", t, &["S", "N", "B"]) {
                    return Some(message);
                }
            }
            None => {
                return Some("AttributeDefinitions element is missing AttributeType".to_string())
            }
        }
    }
    None
}

pub fn validate_image_id(value: &PropertyValue) -> Option<String> {
    match value.as_str() {
        Some(id) if id.starts_with("ami-") => None,
        Some(id) => Some(format!("ImageId must start with 'ami-', got '{}'", id)),
        None => Some("ImageId must be a string".to_string()),
    }
}

pub fn validate_instance_type(value: &PropertyValue) -> Option<String> {
    match value.as_str() {
        Some(t) if INSTANCE_TYPE.is_match(t) => None,
        Some(t) => Some(format!("Invalid instance type: '{}'", t)),
        None => Some("InstanceType must be a string".to_string()),
    }
}

pub fn validate_rest_api_name(value: &PropertyValue) -> Option<String> {
    match value.as_str() {
        Some(name) if !name.trim().is_empty() => None,
        _ => Some("Name must be a non-empty string".to_string()),
    }
}

pub fn validate_topic_name(value: &PropertyValue) -> Option<String> {
    match value.as_str() {
        Some(name) if TOPIC_NAME.is_match(name) => None,
        Some(name) => Some(format!(
            "TopicName may contain 1-256 letters, digits, hyphens and underscores: '{}'",
            name
        )),
        None => Some("TopicName must be a string".to_string()),
    }
}

pub fn validate_visibility_timeout(value: &PropertyValue) -> Option<String> {
    SQS_VISIBILITY_TIMEOUT.check("VisibilityTimeout", value)
}

pub fn validate_retention_period(value: &PropertyValue) -> Option<String> {
    SQS_RETENTION_PERIOD.check("MessageRetentionPeriod", value)
}

pub fn validate_delay_seconds(value: &PropertyValue) -> Option<String> {
    SQS_DELAY.check("DelaySeconds", value)
}

pub fn validate_maximum_message_size(value: &PropertyValue) -> Option<String> {
    SQS_MESSAGE_SIZE.check("MaximumMessageSize", value)
}

pub fn validate_receive_wait(value: &PropertyValue) -> Option<String> {
    SQS_RECEIVE_WAIT.check("ReceiveMessageWaitTimeSeconds", value)
}

// --- Specs ---

static VPC: ResourceSpec = ResourceSpec {
    resource_type: ResourceType::Vpc,
    required: &[],
    optional: &[
        "CidrBlock",
        "EnableDnsHostnames",
        "EnableDnsSupport",
        "InstanceTenancy",
        "Ipv4IpamPoolId",
        "Ipv4NetmaskLength",
        "Tags",
    ],
    validators: &[
        ("CidrBlock", validate_cidr_block as PropertyValidator),
        ("InstanceTenancy", validate_instance_tenancy as PropertyValidator),
        ("EnableDnsHostnames", validate_boolean as PropertyValidator),
        ("EnableDnsSupport", validate_boolean as PropertyValidator),
    ],
};

static SUBNET: ResourceSpec = ResourceSpec {
    resource_type: ResourceType::Subnet,
    required: &["VpcId"],
    optional: &[
        "CidrBlock",
        "AvailabilityZone",
        "AvailabilityZoneId",
        "Ipv6CidrBlock",
        "MapPublicIpOnLaunch",
        "Tags",
    ],
    validators: &[
        ("CidrBlock", validate_cidr_block as PropertyValidator),
        ("MapPublicIpOnLaunch", validate_boolean as PropertyValidator),
    ],
};

static SECURITY_GROUP: ResourceSpec = ResourceSpec {
    resource_type: ResourceType::SecurityGroup,
    required: &["GroupDescription"],
    optional: &[
        "GroupName",
        "VpcId",
        "SecurityGroupIngress",
        "SecurityGroupEgress",
        "Tags",
    ],
    validators: &[
        ("GroupDescription", validate_group_description as PropertyValidator),
        ("SecurityGroupIngress", validate_ingress_rules as PropertyValidator),
    ],
};

static INSTANCE: ResourceSpec = ResourceSpec {
    resource_type: ResourceType::Instance,
    required: &["ImageId"],
    optional: &[
        "InstanceType",
        "KeyName",
        "SubnetId",
        "SecurityGroupIds",
        "IamInstanceProfile",
        "UserData",
        "Monitoring",
        "EbsOptimized",
        "BlockDeviceMappings",
        "Tags",
    ],
    validators: &[
        ("ImageId", validate_image_id as PropertyValidator),
        ("InstanceType", validate_instance_type as PropertyValidator),
        ("Monitoring", validate_boolean as PropertyValidator),
    ],
};

static BUCKET: ResourceSpec = ResourceSpec {
    resource_type: ResourceType::Bucket,
    required: &[],
    optional: &[
        "BucketName",
        "BucketEncryption",
        "PublicAccessBlockConfiguration",
        "VersioningConfiguration",
        "LifecycleConfiguration",
        "LoggingConfiguration",
        "CorsConfiguration",
        "WebsiteConfiguration",
        "NotificationConfiguration",
        "ObjectLockEnabled",
        "Tags",
    ],
    validators: &[
        ("BucketName", validate_bucket_name as PropertyValidator),
        ("VersioningConfiguration", validate_versioning as PropertyValidator),
    ],
};

static FUNCTION: ResourceSpec = ResourceSpec {
    resource_type: ResourceType::Function,
    required: &["Code", "Role"],
    optional: &[
        "Runtime",
        "Handler",
        "MemorySize",
        "Timeout",
        "FunctionName",
        "Description",
        "Environment",
        "Architectures",
        "Layers",
        "VpcConfig",
        "TracingConfig",
        "ReservedConcurrentExecutions",
        "EphemeralStorage",
        "PackageType",
        "Tags",
    ],
    validators: &[
        ("Code", validate_code as PropertyValidator),
        ("Runtime", validate_runtime as PropertyValidator),
        ("MemorySize", validate_memory_size as PropertyValidator),
        ("Timeout", validate_timeout as PropertyValidator),
        ("Handler", validate_handler as PropertyValidator),
    ],
};

static ROLE: ResourceSpec = ResourceSpec {
    resource_type: ResourceType::Role,
    required: &["AssumeRolePolicyDocument"],
    optional: &[
        "RoleName",
        "Description",
        "ManagedPolicyArns",
        "Policies",
        "Path",
        "MaxSessionDuration",
        "PermissionsBoundary",
        "Tags",
    ],
    validators: &[
        ("AssumeRolePolicyDocument", validate_policy_document as PropertyValidator),
        ("MaxSessionDuration", validate_session_duration as PropertyValidator),
    ],
};

static DB_INSTANCE: ResourceSpec = ResourceSpec {
    resource_type: ResourceType::DbInstance,
    required: &["DBInstanceClass"],
    optional: &[
        "Engine",
        "EngineVersion",
        "AllocatedStorage",
        "StorageType",
        "StorageEncrypted",
        "KmsKeyId",
        "MasterUsername",
        "MasterUserPassword",
        "ManageMasterUserPassword",
        "DBName",
        "DBInstanceIdentifier",
        "DBSubnetGroupName",
        "VPCSecurityGroups",
        "BackupRetentionPeriod",
        "MultiAZ",
        "PubliclyAccessible",
        "DeletionProtection",
        "Port",
        "Tags",
    ],
    validators: &[
        ("DBInstanceClass", validate_db_instance_class as PropertyValidator),
        ("Engine", validate_engine as PropertyValidator),
        ("AllocatedStorage", validate_allocated_storage as PropertyValidator),
        ("BackupRetentionPeriod", validate_backup_retention as PropertyValidator),
        ("StorageEncrypted", validate_boolean as PropertyValidator),
        ("MultiAZ", validate_boolean as PropertyValidator),
        ("Port", validate_port as PropertyValidator),
    ],
};

static TABLE: ResourceSpec = ResourceSpec {
    resource_type: ResourceType::Table,
    required: &["KeySchema", "AttributeDefinitions"],
    optional: &[
        "TableName",
        "BillingMode",
        "ProvisionedThroughput",
        "GlobalSecondaryIndexes",
        "LocalSecondaryIndexes",
        "StreamSpecification",
        "SSESpecification",
        "PointInTimeRecoverySpecification",
        "TimeToLiveSpecification",
        "DeletionProtectionEnabled",
        "Tags",
    ],
    validators: &[
        ("KeySchema", validate_key_schema as PropertyValidator),
        ("AttributeDefinitions", validate_attribute_definitions as PropertyValidator),
        ("BillingMode", validate_billing_mode as PropertyValidator),
    ],
};

static REST_API: ResourceSpec = ResourceSpec {
    resource_type: ResourceType::RestApi,
    required: &[],
    optional: &[
        "Name",
        "Description",
        "EndpointConfiguration",
        "Body",
        "BodyS3Location",
        "ApiKeySourceType",
        "BinaryMediaTypes",
        "DisableExecuteApiEndpoint",
        "Policy",
        "Tags",
    ],
    validators: &[("Name", validate_rest_api_name as PropertyValidator)],
};

static TOPIC: ResourceSpec = ResourceSpec {
    resource_type: ResourceType::Topic,
    required: &[],
    optional: &[
        "TopicName",
        "DisplayName",
        "Subscription",
        "KmsMasterKeyId",
        "FifoTopic",
        "ContentBasedDeduplication",
        "Tags",
    ],
    validators: &[
        ("TopicName", validate_topic_name as PropertyValidator),
        ("FifoTopic", validate_boolean as PropertyValidator),
    ],
};

static QUEUE: ResourceSpec = ResourceSpec {
    resource_type: ResourceType::Queue,
    required: &[],
    optional: &[
        "QueueName",
        "VisibilityTimeout",
        "MessageRetentionPeriod",
        "DelaySeconds",
        "MaximumMessageSize",
        "ReceiveMessageWaitTimeSeconds",
        "FifoQueue",
        "ContentBasedDeduplication",
        "RedrivePolicy",
        "SqsManagedSseEnabled",
        "KmsMasterKeyId",
        "Tags",
    ],
    validators: &[
        ("VisibilityTimeout", validate_visibility_timeout as PropertyValidator),
        ("MessageRetentionPeriod", validate_retention_period as PropertyValidator),
        ("DelaySeconds", validate_delay_seconds as PropertyValidator),
        ("MaximumMessageSize", validate_maximum_message_size as PropertyValidator),
        ("ReceiveMessageWaitTimeSeconds", validate_receive_wait as PropertyValidator),
        ("FifoQueue", validate_boolean as PropertyValidator),
        ("SqsManagedSseEnabled", validate_boolean as PropertyValidator),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_type_round_trips_through_lookup() {
        for resource_type in ResourceType::ALL {
            let spec = lookup(resource_type.type_name()).unwrap();
            assert_eq!(spec.resource_type, resource_type);
        }
        assert!(lookup("AWS::Made::Up").is_none());
    }

    #[test]
    fn test_validators_only_cover_known_properties() {
        for resource_type in ResourceType::ALL {
            let spec = resource_type.spec();
            for (name, _) in spec.validators {
                assert!(spec.is_known(name), "{} has a validator but is unknown", name);
            }
        }
    }

    #[test]
    fn test_cidr_block() {
        assert!(validate_cidr_block(&"10.0.0.0/16".into()).is_none());
        assert!(validate_cidr_block(&"10.0.0/16".into()).is_some());
        assert!(validate_cidr_block(&"300.0.0.0/16".into()).is_some());
        assert!(validate_cidr_block(&"10.0.0.0/33".into()).is_some());
    }

    #[test]
    fn test_tenancy() {
        assert!(validate_instance_tenancy(&"dedicated".into()).is_none());
        assert!(validate_instance_tenancy(&"shared".into()).is_some());
    }

    #[test]
    fn test_group_description() {
        assert!(validate_group_description(&"web tier".into()).is_none());
        assert!(validate_group_description(&"".into()).is_some());
        assert!(validate_group_description(&"x".repeat(256).into()).is_some());
        assert!(validate_group_description(&"x".repeat(255).into()).is_none());
    }

    fn rule(protocol: PropertyValue, from: i64, to: i64) -> PropertyValue {
        PropertyValue::list([PropertyValue::map([
            ("IpProtocol", protocol),
            ("FromPort", from.into()),
            ("ToPort", to.into()),
            ("CidrIp", "10.0.0.0/8".into()),
        ])])
    }

    #[test]
    fn test_ingress_accepts_wildcard_ports() {
        assert!(validate_ingress_rules(&rule("-1".into(), -1, -1)).is_none());
        assert!(validate_ingress_rules(&rule((-1i64).into(), -1, -1)).is_none());
        assert!(validate_ingress_rules(&rule("icmp".into(), -1, -1)).is_none());
        assert!(validate_ingress_rules(&rule("tcp".into(), -1, -1)).is_some());
        assert!(validate_ingress_rules(&rule("tcp".into(), 22, 70000)).is_some());
        assert!(validate_ingress_rules(&rule("tcp".into(), 22, 22)).is_none());
    }

    #[test]
    fn test_ingress_requires_protocol() {
        let no_protocol = PropertyValue::list([PropertyValue::map([("FromPort", 22i64.into())])]);
        assert!(validate_ingress_rules(&no_protocol).unwrap().contains("IpProtocol"));
    }

    #[test]
    fn test_bucket_name_rules() {
        assert!(validate_bucket_name(&"my-app-assets".into()).is_none());
        assert!(validate_bucket_name(&"ab".into()).is_some());
        assert!(validate_bucket_name(&"My-Bucket".into()).is_some());
        assert!(validate_bucket_name(&"192.168.1.1".into()).is_some());
        assert!(validate_bucket_name(&"my..bucket".into()).is_some());
        assert!(validate_bucket_name(&"-leading".into()).is_some());
        assert!(validate_bucket_name(&"xn--bucket".into()).is_some());
    }

    #[test]
    fn test_lambda_validators() {
        assert!(validate_runtime(&"nodejs20.x".into()).is_none());
        assert!(validate_runtime(&"cobol85".into()).is_some());
        assert!(validate_memory_size(&PropertyValue::from(128i64)).is_none());
        assert!(validate_memory_size(&PropertyValue::from(127i64)).is_some());
        assert!(validate_memory_size(&PropertyValue::from(10241i64)).is_some());
        assert!(validate_timeout(&PropertyValue::from(900i64)).is_none());
        assert!(validate_timeout(&PropertyValue::from(0i64)).is_some());
        assert!(validate_handler(&"index.handler".into()).is_none());
        assert!(validate_handler(&"index handler".into()).is_some());
    }

    #[test]
    fn test_rds_validators() {
        assert!(validate_db_instance_class(&"db.t3.micro".into()).is_none());
        assert!(validate_db_instance_class(&"t3.micro".into()).is_some());
        assert!(validate_engine(&"postgres".into()).is_none());
        assert!(validate_engine(&"mongodb".into()).is_some());
        assert!(validate_allocated_storage(&"20".into()).is_none());
        assert!(validate_allocated_storage(&PropertyValue::from(19i64)).is_some());
        assert!(validate_allocated_storage(&PropertyValue::from(65537i64)).is_some());
    }

    #[test]
    fn test_dynamodb_and_sqs_validators() {
        assert!(validate_billing_mode(&"PAY_PER_REQUEST".into()).is_none());
        assert!(validate_billing_mode(&"ON_DEMAND".into()).is_some());
        assert!(validate_visibility_timeout(&PropertyValue::from(43200i64)).is_none());
        assert!(validate_visibility_timeout(&PropertyValue::from(43201i64)).is_some());
        assert!(validate_visibility_timeout(&PropertyValue::from(-1i64)).is_some());
    }

    #[test]
    fn test_check_skips_intrinsics() {
        let spec = ResourceType::Function.spec();
        assert!(spec.check("Runtime", &PropertyValue::reference("RuntimeParam")).is_none());
        assert!(spec.check("Runtime", &"cobol85".into()).is_some());
    }

    #[test]
    fn test_bounds_clamp() {
        assert_eq!(LAMBDA_MEMORY.clamp(64), 128);
        assert_eq!(LAMBDA_MEMORY.clamp(20000), 10240);
        assert_eq!(LAMBDA_MEMORY.clamp(512), 512);
    }
}
