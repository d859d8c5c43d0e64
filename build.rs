use std::io::ErrorKind;

fn main() {
    let get_command_id = std::process::Command::new("git")
        .args([
            "describe",
            "--dirty",
            "--always",
            "--match",
            "__EXCLUDE__",
            "--abbrev=7",
        ])
        .output();
    let commit_id = match get_command_id {
        Ok(output) if output.status.success() => {
            String::from_utf8(output.stdout).unwrap_or_default()
        }
        Ok(_) => String::new(),
        Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
        Err(err) => panic!("error when get commit id: {}", err),
    };

    println!("cargo:rustc-env=COMMIT_ID={}", commit_id.trim());
    println!("cargo:rerun-if-changed=build.rs");
}
