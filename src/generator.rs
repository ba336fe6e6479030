//! Template Generator - Graph to Template
//!
//! Total and side-effect free: every node maps to its resources with
//! catalog defaults filling in absent attributes. Nothing is checked here;
//! correctness feedback belongs to the validation pass.
//!
//! Logical ids are the node ids, unmodified.

use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::catalog::{self, defaults, Bounds, ResourceType};
use crate::graph::{ArchitectureEdge, ArchitectureNode, NodeKind};
use crate::templates::{Output, Resource, Template};
use crate::value::PropertyValue;

/// Compile an architecture graph into a template.
pub fn generate(
    nodes: &[ArchitectureNode],
    edges: &[ArchitectureEdge],
    name: &str,
    description: Option<&str>,
) -> Template {
    let description = description
        .map(str::to_string)
        .unwrap_or_else(|| format!("Infrastructure template for {}", name));
    let mut template = Template::new(description);

    let context = Context::new(nodes);
    inspect_edges(&context, edges);

    for node in nodes {
        if template.resources.contains_key(&node.id) {
            warn!(id = %node.id, "duplicate node id; the later node replaces the earlier one");
        }
        match node.resource_type {
            NodeKind::Vpc => emit_vpc(node, &mut template),
            NodeKind::Subnet => emit_subnet(node, &context, &mut template),
            NodeKind::SecurityGroup => emit_security_group(node, &context, &mut template),
            NodeKind::Ec2 => emit_instance(node, &mut template),
            NodeKind::S3 => emit_bucket(node, &mut template),
            NodeKind::Lambda => emit_function(node, &context, &mut template),
            NodeKind::Rds => emit_database(node, &mut template),
            NodeKind::Dynamodb => emit_table(node, &mut template),
            NodeKind::ApiGateway => emit_rest_api(node, &mut template),
            NodeKind::Sns => emit_topic(node, &mut template),
            NodeKind::Sqs => emit_queue(node, &mut template),
            NodeKind::IamRole => emit_role(node, &mut template),
            NodeKind::Unsupported => {
                warn!(id = %node.id, "node has an unsupported resource type; skipped");
                continue;
            }
        }
        debug!(id = %node.id, kind = node.resource_type.as_str(), "node emitted");
    }

    info!(
        name,
        nodes = nodes.len(),
        resources = template.resources.len(),
        outputs = template.outputs.len(),
        "template generated"
    );
    template
}

struct Context<'g> {
    node_ids: HashSet<&'g str>,
    vpc_ids: Vec<&'g str>,
}

impl<'g> Context<'g> {
    fn new(nodes: &'g [ArchitectureNode]) -> Self {
        let mut vpc_ids: Vec<&str> = vec![];
        for node in nodes.iter().filter(|n| n.resource_type == NodeKind::Vpc) {
            if !vpc_ids.contains(&node.id.as_str()) {
                vpc_ids.push(&node.id);
            }
        }
        Self {
            node_ids: nodes.iter().map(|n| n.id.as_str()).collect(),
            vpc_ids,
        }
    }

    /// The node's VPC: its explicit `vpcId`, else the graph's only VPC.
    /// Several VPCs and no `vpcId` is ambiguous and binds nothing.
    fn vpc_for(&self, node: &ArchitectureNode) -> Option<String> {
        if let Some(vpc_id) = node.text("vpcId") {
            return Some(vpc_id.to_string());
        }
        match self.vpc_ids.as_slice() {
            [only] => Some(only.to_string()),
            [] => None,
            _ => {
                warn!(
                    id = %node.id,
                    vpcs = self.vpc_ids.len(),
                    "several VPCs in the graph and no vpcId attribute; VpcId left unset"
                );
                None
            }
        }
    }
}

/// Edges carry no generation semantics yet; they are only checked for
/// endpoints that are not nodes of this graph.
fn inspect_edges(context: &Context<'_>, edges: &[ArchitectureEdge]) {
    for edge in edges {
        let known = context.node_ids.contains(edge.source.as_str())
            && context.node_ids.contains(edge.target.as_str());
        if known {
            debug!(source = %edge.source, target = %edge.target, "edge recorded");
        } else {
            warn!(
                source = %edge.source,
                target = %edge.target,
                "edge names a node that is not in the graph"
            );
        }
    }
}

fn bounded(node: &ArchitectureNode, key: &str, bounds: Bounds, default: i64) -> i64 {
    bounds.clamp(node.number(key).unwrap_or(default))
}

fn text_or(node: &ArchitectureNode, key: &str, default: &str) -> String {
    node.text(key).unwrap_or(default).to_string()
}

fn set_if_present(resource: &mut Resource, property: &str, node: &ArchitectureNode, key: &str) {
    if let Some(value) = node.attribute(key) {
        resource.set(property, value.clone());
    }
}

fn add_output(template: &mut Template, name: String, value: PropertyValue, description: String) {
    template.outputs.insert(name, Output::new(value, description));
}

fn emit_vpc(node: &ArchitectureNode, template: &mut Template) {
    let mut vpc = Resource::new(ResourceType::Vpc.type_name());
    vpc.set("CidrBlock", text_or(node, "cidrBlock", defaults::VPC_CIDR))
        .set("EnableDnsHostnames", true)
        .set("EnableDnsSupport", true);
    set_if_present(&mut vpc, "InstanceTenancy", node, "instanceTenancy");

    template.resources.insert(node.id.clone(), vpc);
    add_output(
        template,
        format!("{}Id", node.id),
        PropertyValue::reference(&node.id),
        format!("VPC id of {}", node.id),
    );
}

fn emit_subnet(node: &ArchitectureNode, context: &Context<'_>, template: &mut Template) {
    let mut subnet = Resource::new(ResourceType::Subnet.type_name());
    if let Some(vpc_id) = context.vpc_for(node) {
        subnet
            .set("VpcId", PropertyValue::reference(&vpc_id))
            .depend_on(vpc_id);
    }
    subnet
        .set("CidrBlock", text_or(node, "cidrBlock", defaults::SUBNET_CIDR))
        .set("MapPublicIpOnLaunch", node.flag("isPublic"));
    set_if_present(&mut subnet, "AvailabilityZone", node, "availabilityZone");

    template.resources.insert(node.id.clone(), subnet);
}

fn web_ingress(port: i64, cidr: &str) -> PropertyValue {
    PropertyValue::map([
        ("IpProtocol", "tcp".into()),
        ("FromPort", port.into()),
        ("ToPort", port.into()),
        ("CidrIp", cidr.into()),
    ])
}

fn emit_security_group(node: &ArchitectureNode, context: &Context<'_>, template: &mut Template) {
    let mut group = Resource::new(ResourceType::SecurityGroup.type_name());
    group.set("GroupDescription", text_or(node, "description", ""));
    if let Some(vpc_id) = context.vpc_for(node) {
        group
            .set("VpcId", PropertyValue::reference(&vpc_id))
            .depend_on(vpc_id);
    }

    let cidr = text_or(node, "ingressCidr", "0.0.0.0/0");
    let ports: Vec<i64> = match node.attribute("ingressPorts").and_then(PropertyValue::as_list) {
        Some(ports) => ports.iter().filter_map(PropertyValue::as_i64).collect(),
        None => vec![80, 443],
    };
    group.set(
        "SecurityGroupIngress",
        PropertyValue::list(ports.into_iter().map(|port| web_ingress(port, &cidr))),
    );

    template.resources.insert(node.id.clone(), group);
}

fn emit_instance(node: &ArchitectureNode, template: &mut Template) {
    let mut instance = Resource::new(ResourceType::Instance.type_name());
    instance
        .set("ImageId", text_or(node, "imageId", defaults::IMAGE_ID))
        .set("InstanceType", text_or(node, "instanceType", defaults::INSTANCE_TYPE));
    set_if_present(&mut instance, "KeyName", node, "keyName");

    if let Some(subnet_id) = node.text("subnetId") {
        instance
            .set("SubnetId", PropertyValue::reference(subnet_id))
            .depend_on(subnet_id);
    }
    let groups = node.ids("securityGroupIds");
    if !groups.is_empty() {
        instance.set(
            "SecurityGroupIds",
            PropertyValue::list(groups.iter().map(PropertyValue::reference)),
        );
        for group in groups {
            instance.depend_on(group);
        }
    }

    template.resources.insert(node.id.clone(), instance);
}

fn emit_bucket(node: &ArchitectureNode, template: &mut Template) {
    let mut bucket = Resource::new(ResourceType::Bucket.type_name());
    set_if_present(&mut bucket, "BucketName", node, "bucketName");
    bucket
        .set(
            "BucketEncryption",
            PropertyValue::map([(
                "ServerSideEncryptionConfiguration",
                PropertyValue::list([PropertyValue::map([(
                    "ServerSideEncryptionByDefault",
                    PropertyValue::map([("SSEAlgorithm", "AES256".into())]),
                )])]),
            )]),
        )
        .set(
            "PublicAccessBlockConfiguration",
            PropertyValue::map([
                ("BlockPublicAcls", true.into()),
                ("BlockPublicPolicy", true.into()),
                ("IgnorePublicAcls", true.into()),
                ("RestrictPublicBuckets", true.into()),
            ]),
        );
    if node.flag("versioning") {
        bucket.set(
            "VersioningConfiguration",
            PropertyValue::map([("Status", "Enabled".into())]),
        );
    }

    template.resources.insert(node.id.clone(), bucket);
    add_output(
        template,
        format!("{}Name", node.id),
        PropertyValue::reference(&node.id),
        format!("Bucket name of {}", node.id),
    );
}

fn assume_role_policy(service: &str) -> PropertyValue {
    PropertyValue::map([
        ("Version", "2012-10-17".into()),
        (
            "Statement",
            PropertyValue::list([PropertyValue::map([
                ("Effect", "Allow".into()),
                ("Principal", PropertyValue::map([("Service", service.into())])),
                ("Action", "sts:AssumeRole".into()),
            ])]),
        ),
    ])
}

/// `{id}Role`, or the first free `{id}Role{n}` when that id is taken by a
/// drawn node or an already emitted resource.
fn auto_role_id(node: &ArchitectureNode, context: &Context<'_>, template: &Template) -> String {
    let base = format!("{}Role", node.id);
    let taken = |id: &str| context.node_ids.contains(id) || template.resources.contains_key(id);
    if !taken(&base) {
        return base;
    }
    let mut n = 2;
    let role_id = loop {
        let candidate = format!("{}{}", base, n);
        if !taken(&candidate) {
            break candidate;
        }
        n += 1;
    };
    warn!(
        id = %node.id,
        taken = %base,
        role = %role_id,
        "execution role id already in use; generated role renamed"
    );
    role_id
}

fn emit_function(node: &ArchitectureNode, context: &Context<'_>, template: &mut Template) {
    let mut function = Resource::new(ResourceType::Function.type_name());
    function
        .set("Runtime", text_or(node, "runtime", defaults::LAMBDA_RUNTIME))
        .set("Handler", text_or(node, "handler", defaults::LAMBDA_HANDLER))
        .set(
            "MemorySize",
            bounded(node, "memorySize", catalog::LAMBDA_MEMORY, defaults::LAMBDA_MEMORY),
        )
        .set(
            "Timeout",
            bounded(node, "timeout", catalog::LAMBDA_TIMEOUT, defaults::LAMBDA_TIMEOUT),
        );

    let code = match (node.text("s3Bucket"), node.text("s3Key")) {
        (Some(bucket), Some(key)) => {
            PropertyValue::map([("S3Bucket", bucket.into()), ("S3Key", key.into())])
        }
        _ => PropertyValue::map([("ZipFile", defaults::LAMBDA_INLINE_CODE.into())]),
    };
    function.set("Code", code);

    if let Some(variables) = node.attribute("environment").filter(|v| v.as_map().is_some()) {
        function.set(
            "Environment",
            PropertyValue::map([("Variables", variables.clone())]),
        );
    }

    match node.text("roleArn") {
        Some(role_arn) => {
            function.set("Role", role_arn);
        }
        None => {
            let role_id = auto_role_id(node, context, template);
            let mut role = Resource::new(ResourceType::Role.type_name());
            role.set("AssumeRolePolicyDocument", assume_role_policy("lambda.amazonaws.com"))
                .set(
                    "ManagedPolicyArns",
                    PropertyValue::list([defaults::LAMBDA_BASIC_EXECUTION_POLICY.into()]),
                );
            function
                .set("Role", PropertyValue::get_att(&role_id, "Arn"))
                .depend_on(role_id.clone());
            template.resources.insert(role_id, role);
        }
    }

    template.resources.insert(node.id.clone(), function);
    add_output(
        template,
        format!("{}Arn", node.id),
        PropertyValue::get_att(&node.id, "Arn"),
        format!("Function ARN of {}", node.id),
    );
}

fn emit_database(node: &ArchitectureNode, template: &mut Template) {
    let mut db = Resource::new(ResourceType::DbInstance.type_name());

    // Numeric strings are read as numbers; the emitted form is always a string.
    let storage = bounded(
        node,
        "allocatedStorage",
        catalog::RDS_STORAGE,
        defaults::DB_ALLOCATED_STORAGE,
    )
    .to_string();
    let encrypted = node
        .attribute("storageEncrypted")
        .map_or(true, PropertyValue::is_truthy);

    db.set(
        "DBInstanceClass",
        text_or(node, "instanceClass", defaults::DB_INSTANCE_CLASS),
    )
    .set("Engine", text_or(node, "engine", defaults::DB_ENGINE))
    .set("AllocatedStorage", storage)
    .set("StorageEncrypted", encrypted)
    .set(
        "BackupRetentionPeriod",
        bounded(
            node,
            "backupRetentionPeriod",
            catalog::RDS_BACKUP_RETENTION,
            defaults::DB_BACKUP_RETENTION,
        ),
    )
    .set(
        "MasterUsername",
        text_or(node, "masterUsername", defaults::DB_MASTER_USERNAME),
    )
    .set("ManageMasterUserPassword", true);
    set_if_present(&mut db, "EngineVersion", node, "engineVersion");
    set_if_present(&mut db, "DBName", node, "dbName");
    if node.attribute("multiAz").is_some() {
        db.set("MultiAZ", node.flag("multiAz"));
    }

    let groups = node.ids("securityGroupIds");
    if !groups.is_empty() {
        db.set(
            "VPCSecurityGroups",
            PropertyValue::list(groups.iter().map(|g| PropertyValue::get_att(g, "GroupId"))),
        );
        for group in groups {
            db.depend_on(group);
        }
    }

    template.resources.insert(node.id.clone(), db);
}

fn key_entry(name: &str, key_type: &str) -> PropertyValue {
    PropertyValue::map([("AttributeName", name.into()), ("KeyType", key_type.into())])
}

fn attribute_definition(name: &str) -> PropertyValue {
    PropertyValue::map([("AttributeName", name.into()), ("AttributeType", "S".into())])
}

fn emit_table(node: &ArchitectureNode, template: &mut Template) {
    let mut table = Resource::new(ResourceType::Table.type_name());
    set_if_present(&mut table, "TableName", node, "tableName");

    let partition_key = text_or(node, "partitionKey", defaults::DYNAMODB_PARTITION_KEY);
    let mut key_schema = vec![key_entry(&partition_key, "HASH")];
    let mut definitions = vec![attribute_definition(&partition_key)];
    if let Some(sort_key) = node.text("sortKey") {
        key_schema.push(key_entry(sort_key, "RANGE"));
        definitions.push(attribute_definition(sort_key));
    }

    let billing_mode = text_or(node, "billingMode", defaults::DYNAMODB_BILLING_MODE);
    table
        .set("KeySchema", PropertyValue::List(key_schema))
        .set("AttributeDefinitions", PropertyValue::List(definitions));
    if billing_mode == "PROVISIONED" {
        let read = bounded(
            node,
            "readCapacity",
            catalog::DYNAMODB_CAPACITY,
            defaults::DYNAMODB_CAPACITY,
        );
        let write = bounded(
            node,
            "writeCapacity",
            catalog::DYNAMODB_CAPACITY,
            defaults::DYNAMODB_CAPACITY,
        );
        table.set(
            "ProvisionedThroughput",
            PropertyValue::map([
                ("ReadCapacityUnits", read.into()),
                ("WriteCapacityUnits", write.into()),
            ]),
        );
    }
    table.set("BillingMode", billing_mode);

    template.resources.insert(node.id.clone(), table);
    add_output(
        template,
        format!("{}Name", node.id),
        PropertyValue::reference(&node.id),
        format!("Table name of {}", node.id),
    );
}

fn emit_rest_api(node: &ArchitectureNode, template: &mut Template) {
    let mut api = Resource::new(ResourceType::RestApi.type_name());
    api.set("Name", text_or(node, "name", &node.id));
    set_if_present(&mut api, "Description", node, "description");
    api.set(
        "EndpointConfiguration",
        PropertyValue::map([(
            "Types",
            PropertyValue::list([text_or(node, "endpointType", "REGIONAL").into()]),
        )]),
    );

    template.resources.insert(node.id.clone(), api);
    add_output(
        template,
        format!("{}Id", node.id),
        PropertyValue::reference(&node.id),
        format!("REST API id of {}", node.id),
    );
}

fn emit_topic(node: &ArchitectureNode, template: &mut Template) {
    let mut topic = Resource::new(ResourceType::Topic.type_name());
    set_if_present(&mut topic, "TopicName", node, "topicName");
    set_if_present(&mut topic, "DisplayName", node, "displayName");
    topic.set("KmsMasterKeyId", defaults::SNS_KMS_KEY);

    template.resources.insert(node.id.clone(), topic);
    add_output(
        template,
        format!("{}Arn", node.id),
        PropertyValue::reference(&node.id),
        format!("Topic ARN of {}", node.id),
    );
}

fn emit_queue(node: &ArchitectureNode, template: &mut Template) {
    let mut queue = Resource::new(ResourceType::Queue.type_name());
    set_if_present(&mut queue, "QueueName", node, "queueName");
    queue
        .set(
            "VisibilityTimeout",
            bounded(
                node,
                "visibilityTimeout",
                catalog::SQS_VISIBILITY_TIMEOUT,
                defaults::SQS_VISIBILITY_TIMEOUT,
            ),
        )
        .set(
            "MessageRetentionPeriod",
            bounded(
                node,
                "messageRetentionPeriod",
                catalog::SQS_RETENTION_PERIOD,
                defaults::SQS_RETENTION_PERIOD,
            ),
        )
        .set("SqsManagedSseEnabled", true);
    if node.flag("fifo") {
        queue.set("FifoQueue", true);
    }

    template.resources.insert(node.id.clone(), queue);
    add_output(
        template,
        format!("{}Url", node.id),
        PropertyValue::reference(&node.id),
        format!("Queue URL of {}", node.id),
    );
}

fn emit_role(node: &ArchitectureNode, template: &mut Template) {
    let mut role = Resource::new(ResourceType::Role.type_name());
    role.set(
        "AssumeRolePolicyDocument",
        assume_role_policy(&text_or(node, "service", defaults::ROLE_SERVICE)),
    );
    set_if_present(&mut role, "ManagedPolicyArns", node, "managedPolicyArns");
    set_if_present(&mut role, "RoleName", node, "roleName");

    template.resources.insert(node.id.clone(), role);
}
