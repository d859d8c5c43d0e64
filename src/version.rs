pub fn version_string() -> String {
    let major = env!("CARGO_PKG_VERSION_MAJOR")
        .parse::<u8>()
        .expect("CARGO_PKG_VERSION_MAJOR parse success");
    let minor = env!("CARGO_PKG_VERSION_MINOR")
        .parse::<u8>()
        .expect("CARGO_PKG_VERSION_MINOR parse success");
    let patch = env!("CARGO_PKG_VERSION_PATCH")
        .parse::<u16>()
        .expect("CARGO_PKG_VERSION_PATCH parse success");
    let mut version = format!("{}.{}.{}", major, minor, patch);
    let pre = env!("CARGO_PKG_VERSION_PRE");
    if !pre.is_empty() {
        version.push('-');
        version.push_str(pre);
    }
    let commit_id = env!("COMMIT_ID");
    if !commit_id.is_empty() {
        version.push(' ');
        version.push_str(commit_id);
    }
    version
}
