// Project directories under ~/.claude/projects are named by flattening the
// workspace path: every `/` becomes `-` and the leading `-` is stripped.
// The mapping is lossy for path segments that themselves contain hyphens
// (`/home/my-app` and `/home/my/app` encode identically); the scheme is kept
// bit-for-bit anyway because the external chat application owns the on-disk
// names.

pub fn encode_project_path(path: &str) -> String {
    let encoded = path.replace('/', "-");
    match encoded.strip_prefix('-') {
        Some(rest) => rest.to_string(),
        None => encoded,
    }
}

pub fn decode_project_key(key: &str) -> String {
    format!("/{}", key.replace('-', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_by_flattening_separators() {
        assert_eq!(encode_project_path("/home/user/code"), "home-user-code");
        assert_eq!(encode_project_path("relative/dir"), "relative-dir");
    }

    #[test]
    fn decodes_by_restoring_separators() {
        assert_eq!(decode_project_key("home-user-code"), "/home/user/code");
    }

    #[test]
    fn round_trips_hyphen_free_paths() {
        for path in ["/home/user/code", "/tmp", "/a/b/c/d"] {
            assert_eq!(decode_project_key(&encode_project_path(path)), path);
        }
    }

    #[test]
    fn hyphenated_segments_decode_ambiguously() {
        let encoded = encode_project_path("/home/my-app");
        assert_eq!(decode_project_key(&encoded), "/home/my/app");
    }
}
