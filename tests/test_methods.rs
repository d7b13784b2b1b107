mod common;

use common::{Site, request, request_with_body};

fn file_names(dir: &std::path::Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

// GET / HEAD

#[tokio::test]
async fn test_get_file_returns_exact_bytes() {
    let site = Site::new();
    site.write("docs/hello.txt", b"hello world");

    let resp = site.send(&request("GET", "/docs/hello.txt")).await;

    assert_eq!(resp.status, 200);
    assert_eq!(resp.status_line, "HTTP/1.1 200 OK");
    assert_eq!(resp.body, b"hello world".to_vec());
    assert_eq!(resp.header("Content-Length"), Some("11"));
    assert_eq!(resp.header("Content-type"), Some("text/plain"));
    assert!(resp.header("Last-Modified").unwrap().ends_with(" GMT"));
}

#[tokio::test]
async fn test_get_unknown_extension_is_octet_stream() {
    let site = Site::new();
    site.write("blob.xyz", &[0, 1, 2, 3]);

    let resp = site.send(&request("GET", "/blob.xyz")).await;

    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("Content-type"), Some("application/octet-stream"));
    assert_eq!(resp.body, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn test_head_sends_headers_without_body() {
    let site = Site::new();
    site.write("index.html", b"<html></html>");

    let resp = site.send(&request("HEAD", "/index.html")).await;

    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("Content-Length"), Some("13"));
    assert_eq!(resp.header("Content-type"), Some("text/html"));
    assert!(resp.header("Last-Modified").is_some());
    assert!(resp.body.is_empty());
}

#[tokio::test]
async fn test_get_missing_file_is_not_found() {
    let site = Site::new();

    let resp = site.send(&request("GET", "/nope.txt")).await;

    assert_eq!(resp.status, 404);
    assert_eq!(resp.header("Content-Length"), Some("0"));
    assert!(resp.body.is_empty());
}

#[tokio::test]
async fn test_get_file_with_trailing_slash_is_not_found() {
    let site = Site::new();
    site.write("a.txt", b"a");

    let resp = site.send(&request("GET", "/a.txt/")).await;

    assert_eq!(resp.status, 404);
}

#[tokio::test]
async fn test_get_directory_without_slash_is_not_allowed() {
    let site = Site::new();
    site.mkdir("photos");

    let resp = site.send(&request("GET", "/photos")).await;

    assert_eq!(resp.status, 405);
    assert!(resp.header("Location").is_none());
}

#[tokio::test]
async fn test_get_directory_with_slash_lists_entries() {
    let site = Site::new();
    site.write("photos/a.png", b"png");
    site.write("photos/b.txt", b"text");
    site.mkdir("photos/album");

    let resp = site.send(&request("GET", "/photos/")).await;

    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("Content-type"), Some("text/html"));
    assert_eq!(
        resp.header("Content-Length").unwrap(),
        resp.body.len().to_string()
    );

    let html = resp.text();
    assert!(html.contains("Index of /photos/"));
    assert!(html.contains("<a href=\"a.png\">a.png</a>"));
    assert!(html.contains("<a href=\"album/\">album</a>"));
    assert!(html.contains("<a href=\"../\">Parent Directory</a>"));
    // entries plus "..", without "."
    assert_eq!(html.matches("<td><a href=").count(), 4);
}

#[tokio::test]
async fn test_head_directory_listing_has_length_but_no_body() {
    let site = Site::new();
    site.write("x.txt", b"x");

    let get = site.send(&request("GET", "/")).await;
    let head = site.send(&request("HEAD", "/")).await;

    assert_eq!(head.status, 200);
    assert!(head.body.is_empty());
    assert_eq!(
        head.header("Content-Length").unwrap(),
        get.body.len().to_string()
    );
}

#[tokio::test]
async fn test_root_listing_has_no_parent_row() {
    let site = Site::new();
    site.write("one.txt", b"1");
    site.write("two.txt", b"2");

    let resp = site.send(&request("GET", "/")).await;

    let html = resp.text();
    assert!(!html.contains("Parent Directory"));
    assert_eq!(html.matches("<td><a href=").count(), 2);
}

#[tokio::test]
async fn test_listing_links_reach_awkward_names() {
    let site = Site::new();
    site.write("odd/my notes #1?.txt", b"found me");
    site.mkdir("odd/sub dir");

    let listing = site.send(&request("GET", "/odd/")).await;
    let html = listing.text();

    let file_link = "my%20notes%20%231%3F.txt";
    let dir_link = "sub%20dir/";
    assert!(html.contains(&format!("<a href=\"{}\">", file_link)));
    assert!(html.contains(&format!("<a href=\"{}\">", dir_link)));

    let file = site.send(&request("GET", &format!("/odd/{}", file_link))).await;
    assert_eq!(file.status, 200);
    assert_eq!(file.body, b"found me".to_vec());

    let dir = site.send(&request("GET", &format!("/odd/{}", dir_link))).await;
    assert_eq!(dir.status, 200);
    assert!(dir.text().contains("Index of /odd/sub dir/"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_head_matches_get_for_unreadable_file() {
    use std::os::unix::fs::PermissionsExt;

    let site = Site::new();
    site.write("locked.txt", b"secret");
    let path = site.path("locked.txt");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();

    // permissions do not bind a privileged user
    if std::fs::File::open(&path).is_ok() {
        return;
    }

    let get = site.send(&request("GET", "/locked.txt")).await;
    let head = site.send(&request("HEAD", "/locked.txt")).await;

    assert_eq!(get.status, 403);
    assert_eq!(head.status, get.status);
    assert!(head.body.is_empty());
    assert_eq!(head.header("Content-Length"), Some("0"));
}

#[tokio::test]
async fn test_traversal_outside_root_is_forbidden() {
    let site = Site::new();
    site.write("secret.txt", b"inside");

    for uri in [
        "/../../etc/passwd",
        "/..",
        "/a/../../etc/passwd",
        "/./../secret.txt",
        "/docs/../../../",
    ] {
        let resp = site.send(&request("GET", uri)).await;
        assert_eq!(resp.status, 403, "uri {}", uri);
        assert!(resp.body.is_empty(), "uri {}", uri);
    }
}

#[tokio::test]
async fn test_dot_segments_inside_root_resolve() {
    let site = Site::new();
    site.write("docs/a.txt", b"A");

    let resp = site.send(&request("GET", "/docs/sub/.././/a.txt")).await;

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, b"A".to_vec());
}

// PUT

#[tokio::test]
async fn test_put_creates_file_and_intermediate_directories() {
    let site = Site::new();

    let resp = site
        .send(&request_with_body("PUT", "/a/b/c/new.txt", "text/plain", b"fresh"))
        .await;

    assert_eq!(resp.status, 201);
    let expected = site.path("a/b/c/new.txt");
    assert_eq!(resp.header("Location"), Some(expected.display().to_string().as_str()));
    assert_eq!(std::fs::read(&expected).unwrap(), b"fresh");

    let get = site.send(&request("GET", "/a/b/c/new.txt")).await;
    assert_eq!(get.status, 200);
    assert_eq!(get.body, b"fresh".to_vec());
}

#[tokio::test]
async fn test_get_put_get_returns_latest_bytes() {
    let site = Site::new();
    site.write("note.txt", b"original contents");

    let first = site.send(&request("GET", "/note.txt")).await;
    assert_eq!(first.body, b"original contents".to_vec());

    let put = site
        .send(&request_with_body("PUT", "/note.txt", "text/plain", b"abc"))
        .await;
    assert_eq!(put.status, 200);
    assert!(put.header("Location").is_none());

    let second = site.send(&request("GET", "/note.txt")).await;
    assert_eq!(second.body, b"abc".to_vec());
    assert_eq!(second.header("Content-Length"), Some("3"));
}

#[tokio::test]
async fn test_put_without_content_length_is_rejected() {
    let site = Site::new();

    let resp = site
        .send(b"PUT /a/new.txt HTTP/1.0\r\nContent-type: text/plain\r\n\r\nhello")
        .await;

    assert_eq!(resp.status, 411);
    assert!(!site.path("a").exists());
}

#[tokio::test]
async fn test_put_onto_directory_is_not_allowed() {
    let site = Site::new();
    site.mkdir("dir");

    for uri in ["/dir", "/dir/"] {
        let resp = site
            .send(&request_with_body("PUT", uri, "text/plain", b"x"))
            .await;
        assert_eq!(resp.status, 405, "uri {}", uri);
    }
    assert!(site.path("dir").is_dir());
}

#[tokio::test]
async fn test_put_new_path_with_trailing_slash_is_not_allowed() {
    let site = Site::new();

    let resp = site
        .send(&request_with_body("PUT", "/fresh/", "text/plain", b"x"))
        .await;

    assert_eq!(resp.status, 405);
    assert!(!site.path("fresh").exists());
}

#[tokio::test]
async fn test_put_below_a_file_is_not_allowed() {
    let site = Site::new();
    site.write("plain.txt", b"p");

    let resp = site
        .send(&request_with_body("PUT", "/plain.txt/child.txt", "text/plain", b"x"))
        .await;

    assert_eq!(resp.status, 405);
    assert_eq!(std::fs::read(site.path("plain.txt")).unwrap(), b"p");
}

#[tokio::test]
async fn test_put_with_short_body_is_bad_request() {
    let site = Site::new();

    let resp = site
        .send(b"PUT /short.txt HTTP/1.0\r\nContent-Length: 10\r\n\r\nabc")
        .await;

    assert_eq!(resp.status, 400);
    assert!(!site.path("short.txt").exists());
}

#[tokio::test]
async fn test_put_reads_only_content_length_bytes() {
    let site = Site::new();

    let resp = site
        .send(b"PUT /exact.txt HTTP/1.0\r\nContent-Length: 4\r\n\r\nabcdEXTRA")
        .await;

    assert_eq!(resp.status, 201);
    assert_eq!(std::fs::read(site.path("exact.txt")).unwrap(), b"abcd");
}

#[tokio::test]
async fn test_put_with_lowercase_content_length_header() {
    let site = Site::new();

    let resp = site
        .send(b"PUT /lower.txt HTTP/1.0\r\ncontent-length: 2\r\n\r\nok")
        .await;

    assert_eq!(resp.status, 201);
    assert_eq!(std::fs::read(site.path("lower.txt")).unwrap(), b"ok");
}

// POST

#[tokio::test]
async fn test_post_text_plain_creates_txt_member() {
    let site = Site::new();

    let resp = site
        .send(&request_with_body("POST", "/inbox", "text/plain", b"hello"))
        .await;

    assert_eq!(resp.status, 201);

    let names = file_names(&site.path("inbox"));
    assert_eq!(names.len(), 1);
    let name = &names[0];
    assert!(name.ends_with(".txt"));
    assert_eq!(name.len(), 10 + ".txt".len());

    let member = site.path("inbox").join(name);
    assert_eq!(std::fs::read(&member).unwrap(), b"hello");
    assert_eq!(resp.header("Location"), Some(member.display().to_string().as_str()));
}

#[tokio::test]
async fn test_post_suffix_follows_content_type() {
    let cases = [
        ("application/x-www-form-urlencoded", ".urlencoded"),
        ("multipart/form-data; boundary=----x", ".mime"),
        ("text/plain; charset=utf-8", ".txt"),
        ("application/json", ".bin"),
    ];

    for (content_type, suffix) in cases {
        let site = Site::new();
        let resp = site
            .send(&request_with_body("POST", "/forms", content_type, b"a=1"))
            .await;

        assert_eq!(resp.status, 201, "content type {}", content_type);
        let names = file_names(&site.path("forms"));
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(suffix), "{} for {}", names[0], content_type);
    }
}

#[tokio::test]
async fn test_post_without_content_type_is_bin() {
    let site = Site::new();

    let resp = site
        .send(b"POST /drop HTTP/1.0\r\nContent-Length: 3\r\n\r\nabc")
        .await;

    assert_eq!(resp.status, 201);
    assert!(resp.header("Location").unwrap().ends_with(".bin"));
}

#[tokio::test]
async fn test_post_into_existing_collection_adds_members() {
    let site = Site::new();
    site.write("inbox/existing.txt", b"old");

    for body in [&b"one"[..], &b"two"[..]] {
        let resp = site
            .send(&request_with_body("POST", "/inbox", "text/plain", body))
            .await;
        assert_eq!(resp.status, 201);
    }

    assert_eq!(file_names(&site.path("inbox")).len(), 3);
}

#[tokio::test]
async fn test_post_to_file_is_not_allowed() {
    let site = Site::new();
    site.write("file.txt", b"f");

    let resp = site
        .send(&request_with_body("POST", "/file.txt", "text/plain", b"x"))
        .await;

    assert_eq!(resp.status, 405);
}

#[tokio::test]
async fn test_post_with_trailing_slash_is_not_allowed() {
    let site = Site::new();
    site.mkdir("inbox");

    let resp = site
        .send(&request_with_body("POST", "/inbox/", "text/plain", b"x"))
        .await;

    assert_eq!(resp.status, 405);
    assert!(file_names(&site.path("inbox")).is_empty());
}

#[tokio::test]
async fn test_post_without_content_length_is_rejected() {
    let site = Site::new();

    let resp = site
        .send(b"POST /inbox HTTP/1.0\r\nContent-type: text/plain\r\n\r\n")
        .await;

    assert_eq!(resp.status, 411);
    assert!(!site.path("inbox").exists());
}

// DELETE

#[tokio::test]
async fn test_delete_non_empty_directory_is_refused() {
    let site = Site::new();
    site.write("full/keep.txt", b"keep");

    let resp = site.send(&request("DELETE", "/full/")).await;

    assert_eq!(resp.status, 405);
    assert_eq!(std::fs::read(site.path("full/keep.txt")).unwrap(), b"keep");
}

#[tokio::test]
async fn test_delete_empty_directory() {
    let site = Site::new();
    site.mkdir("empty");

    let resp = site.send(&request("DELETE", "/empty/")).await;

    assert_eq!(resp.status, 200);
    assert!(!site.path("empty").exists());

    let get = site.send(&request("GET", "/empty/")).await;
    assert_eq!(get.status, 404);
}

#[tokio::test]
async fn test_delete_file_then_get_is_not_found() {
    let site = Site::new();
    site.write("gone.txt", b"bye");

    let resp = site.send(&request("DELETE", "/gone.txt")).await;
    assert_eq!(resp.status, 200);
    assert!(!site.path("gone.txt").exists());

    let get = site.send(&request("GET", "/gone.txt")).await;
    assert_eq!(get.status, 404);
}

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let site = Site::new();

    let resp = site.send(&request("DELETE", "/missing.txt")).await;

    assert_eq!(resp.status, 404);
}

#[tokio::test]
async fn test_delete_content_root_is_refused() {
    let site = Site::new();

    let resp = site.send(&request("DELETE", "/")).await;

    assert_eq!(resp.status, 405);
    assert!(site.root().is_dir());
}
