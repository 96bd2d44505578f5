//! Integration tests for the command output parsers.

use gpfs_exporter::parse::{
    parse_mmgetstate, parse_mmlsfs, parse_status, query_unescape, StatusPattern,
};
use gpfs_exporter::ParseError;

/// `mmlsfs all -Y -T` output from a two-filesystem cluster.
const MMLSFS: &str = "\
mmlsfs::HEADER:version:reserved:reserved:deviceName:fieldName:data:remarks:
mmlsfs::0:1:::project:defaultMountPoint:%2Ffs%2Fproject::
mmlsfs::0:1:::scratch:defaultMountPoint:%2Ffs%2Fscratch+space::
";

#[test]
fn test_mmlsfs_cluster_output() {
    let filesystems = parse_mmlsfs(MMLSFS);
    let pairs: Vec<(&str, &str)> = filesystems
        .iter()
        .map(|fs| (fs.name.as_str(), fs.mountpoint.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![("project", "/fs/project"), ("scratch", "/fs/scratch space")]
    );
}

#[test]
fn test_mmlsfs_never_panics_on_arbitrary_rows() {
    let fragments = ["", "HEADER", "x", "%", "%2", "%zz", "%2F", "+", "a b"];

    for width in 0..12 {
        for fragment in fragments {
            let line = vec![fragment; width].join(":");
            let parsed = parse_mmlsfs(&line);
            if width < 7 || fragment == "HEADER" {
                assert!(parsed.is_empty(), "row {:?} should be skipped", line);
            }
            for fs in parsed {
                assert_eq!(fs.name, fragment);
            }
        }
    }
}

#[test]
fn test_mmlsfs_bad_row_does_not_hide_good_rows() {
    let out = "\
mmlsfs::0:1:::bad:defaultMountPoint:%G1::
mmlsfs::0:1:::good:defaultMountPoint:%2Fgood::
";
    let filesystems = parse_mmlsfs(out);
    assert_eq!(filesystems.len(), 1);
    assert_eq!(filesystems[0].name, "good");
    assert_eq!(filesystems[0].mountpoint, "/good");
}

#[test]
fn test_mmgetstate_first_data_row_wins() {
    let out = "\
mmgetstate::HEADER:version:reserved:reserved:nodeName:nodeNumber:state:quorum:nodesUp:totalNodes:remarks:cnfsState:
mmgetstate::0:1:::nsd01:1:arbitrating:1:2:2:::
mmgetstate::0:1:::nsd02:2:active:1:2:2:::
";
    assert_eq!(parse_mmgetstate(out).unwrap().status, "arbitrating");
}

#[test]
fn test_mmgetstate_only_header_is_no_data() {
    let out = "mmgetstate::HEADER:version:reserved:reserved:nodeName:nodeNumber:state:quorum:\n";
    assert!(matches!(parse_mmgetstate(out), Err(ParseError::NoData(_))));
}

#[test]
fn test_status_label_with_regex_metacharacters() {
    let out = "a.b (x) status: ready\n";
    assert_eq!(parse_status(out, "a.b (x)").unwrap().status, "ready");
    assert!(parse_status("aXb (x) status: ready", "a.b (x)").is_err());
}

#[test]
fn test_status_value_must_be_on_the_label_line() {
    let out = "VERBS RDMA status:\nmmfsadm: something else\n";
    assert!(matches!(
        parse_status(out, "VERBS RDMA"),
        Err(ParseError::PatternNotFound(_))
    ));

    let pattern = StatusPattern::new("VERBS RDMA").unwrap();
    assert!(pattern.parse("VERBS RDMA status: \t\n started\n").is_err());
    assert_eq!(
        pattern
            .parse("VERBS RDMA status:\nVERBS RDMA status: started\n")
            .unwrap()
            .status,
        "started"
    );
}

#[test]
fn test_query_unescape_accepts_only_complete_escapes() {
    for valid in ["", "plain", "%41", "a+b", "%2f%2F"] {
        assert!(query_unescape(valid).is_ok(), "{:?} should decode", valid);
    }
    for invalid in ["%", "%4", "%4g", "abc%"] {
        assert!(
            matches!(query_unescape(invalid), Err(ParseError::InvalidEscape(_))),
            "{:?} should be rejected",
            invalid
        );
    }
}
