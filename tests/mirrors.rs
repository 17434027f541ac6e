// tests/mirrors.rs

//! Mirror-list fallback and local repositories.

mod common;

use common::{BASE, bbq};
use repomd::{
    Error, HttpFetcher, LoadOptions, MemoryFetcher, Repository, TransportError,
};

const MIRRORLIST: &str = "https://example.com/mirrorlist";

#[test]
fn test_second_mirror_wins() {
    let mut fetcher = common::xml_repo();
    fetcher.insert(
        MIRRORLIST,
        format!("# mirrors\nhttps://dead.example.com/bbq\n{BASE}\n"),
    );

    let repo = Repository::load_with(MIRRORLIST, &fetcher, &LoadOptions::default()).unwrap();
    assert_eq!(repo.count().unwrap(), 5);
    assert_eq!(repo.url(), MIRRORLIST);
    assert_eq!(repo.base().as_str(), BASE);
    assert_eq!(
        repo.find("chicken").unwrap().unwrap().nevra().unwrap(),
        "chicken-2.2.10-1.fc27.noarch"
    );

    let requests = fetcher.requests();
    assert_eq!(requests[0], format!("{MIRRORLIST}/repodata/repomd.xml"));
    assert_eq!(requests[1], MIRRORLIST);
    assert_eq!(requests[2], "https://dead.example.com/bbq/repodata/repomd.xml");
    assert_eq!(requests[3], format!("{BASE}/repodata/repomd.xml"));
}

#[test]
fn test_streams_come_from_the_mirror() {
    let packages = bbq();
    let mut fetcher = MemoryFetcher::new();
    let mirror = "https://mirror.example.org/pub/bbq";
    common::serve(
        &mut fetcher,
        mirror,
        vec![common::primary_xml_stream(&packages)],
    );
    fetcher.insert(MIRRORLIST, format!("{mirror}\n"));

    let repo = Repository::load_with(MIRRORLIST, &fetcher, &LoadOptions::default()).unwrap();
    assert_eq!(repo.base().as_str(), mirror);
    assert!(
        fetcher
            .requests()
            .contains(&format!("{mirror}/repodata/0001-primary.xml.gz"))
    );
}

#[test]
fn test_empty_mirror_list() {
    let fetcher = MemoryFetcher::new().with(MIRRORLIST, "\n\nnot-a-url\n");
    let err = Repository::load_with(MIRRORLIST, &fetcher, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::NotARepository { .. }));
}

#[test]
fn test_every_mirror_fails() {
    let fetcher = MemoryFetcher::new()
        .with(MIRRORLIST, "https://a.example.com/\nhttps://b.example.com/\n")
        .with_status("https://b.example.com/repodata/repomd.xml", 502);
    let err = Repository::load_with(MIRRORLIST, &fetcher, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::NotARepository { .. }));
}

#[test]
fn test_server_error_propagates() {
    let fetcher = MemoryFetcher::new()
        .with_status(&format!("{BASE}/repodata/repomd.xml"), 500)
        .with(BASE, "https://mirror.example.org/\n");
    let err = Repository::load_with(BASE, &fetcher, &LoadOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::Transport(TransportError::Status { status: 500, .. })
    ));
}

#[test]
fn test_fallback_disabled() {
    let fetcher = MemoryFetcher::new().with(MIRRORLIST, format!("{BASE}\n"));
    let options = LoadOptions {
        mirror_fallback: false,
        ..LoadOptions::default()
    };
    let err = Repository::load_with(MIRRORLIST, &fetcher, &options).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_local_repository() {
    let dir = tempfile::tempdir().unwrap();
    let packages = bbq();
    let streams = vec![
        common::primary_xml_stream(&packages),
        common::filelists_stream(&packages),
    ];

    std::fs::create_dir_all(dir.path().join("repodata")).unwrap();
    std::fs::write(
        dir.path().join("repodata/repomd.xml"),
        common::repomd_xml(&streams),
    )
    .unwrap();
    for stream in &streams {
        std::fs::write(dir.path().join(&stream.href), &stream.bytes).unwrap();
    }

    let fetcher = HttpFetcher::new().unwrap();
    let path = dir.path().to_str().unwrap();
    let options = LoadOptions {
        filelists: true,
        ..LoadOptions::default()
    };
    let repo = Repository::load_with(path, &fetcher, &options).unwrap();

    assert_eq!(repo.count().unwrap(), 5);
    assert_eq!(
        repo.find("beef-ribs").unwrap().unwrap().files,
        vec!["/usr/share/beef-ribs"]
    );
}

#[test]
fn test_local_path_without_repository() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = HttpFetcher::new().unwrap();
    let err = Repository::load_with(dir.path().to_str().unwrap(), &fetcher, &LoadOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::NotARepository { .. }));
}
