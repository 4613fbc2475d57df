use std::path::PathBuf;

const PROTO_FILES: &[&str] = &[
    "proto/fastblog/v1/apiserver.proto",
    "proto/fastblog/v1/healthz.proto",
    "proto/fastblog/v1/user.proto",
    "proto/fastblog/v1/post.proto",
];
const PROTO_INCLUDES: &[&str] = &["proto"];

/// JSON names for identifier fields; everything else is plain camelCase.
const FIELD_RENAMES: &[(&str, &str)] = &[
    ("user_id", "userID"),
    ("post_id", "postID"),
    ("post_ids", "postIDs"),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);

    // A PROTOC from the environment wins over the bundled compiler.
    let mut config = prost_build::Config::new();
    if std::env::var_os("PROTOC").is_none() {
        config.protoc_executable(protoc_bin_vendored::protoc_bin_path()?);
    }

    let mut builder = tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(out_dir.join("fastblog_descriptor.bin"))
        .message_attribute(".fastblog.v1", "#[derive(serde::Serialize, serde::Deserialize)]")
        .message_attribute(".fastblog.v1", "#[serde(rename_all = \"camelCase\", default)]");

    for (field, json) in FIELD_RENAMES {
        builder = builder.field_attribute(field, format!("#[serde(rename = \"{json}\")]"));
    }

    builder.compile_protos_with_config(config, PROTO_FILES, PROTO_INCLUDES)?;

    for path in PROTO_FILES {
        println!("cargo:rerun-if-changed={path}");
    }
    Ok(())
}
