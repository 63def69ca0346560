mod common;
use common::stim_signal;
use stimlag::io::{load_recording, load_state, save_state, write_design, write_recording};
use stimlag::{build_design_matrix, resolve_epochs, Error, Interval, SignalSource};

#[test]
fn recording_container_preserves_epochs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rec.safetensors");
    let sig = stim_signal(3, 5);
    write_recording(&sig, &path).unwrap();

    let loaded = load_recording(&path).unwrap();
    assert_eq!(loaded.data, sig.data);
    assert_eq!(loaded.fs, sig.fs);
    assert_eq!(loaded.channel_names(), sig.channel_names());
    assert_eq!(loaded.epochs, sig.epochs);

    let interval = Interval::new(0.5, 4.0);
    assert_eq!(
        resolve_epochs(&loaded, &interval).unwrap(),
        resolve_epochs(&sig, &interval).unwrap()
    );
}

#[test]
fn state_cache_hit_and_miss() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.safetensors");
    assert!(load_state(&path).unwrap().is_none());

    let sig = stim_signal(4, 2);
    let stim = build_design_matrix(sig.data.view(), 2, 3).unwrap();
    let resp = sig.data.t().to_owned();
    save_state(&path, &stim, &resp).unwrap();

    let (s, r) = load_state(&path).unwrap().unwrap();
    assert_eq!(s, stim);
    assert_eq!(r, resp);
}

#[test]
fn design_file_is_not_a_state_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("design.safetensors");
    let sig = stim_signal(2, 2);
    let dm = build_design_matrix(sig.data.view(), 2, 1).unwrap();
    write_design(&dm, &path).unwrap();

    // A design file has no `stim` / `resp` tensors.
    let err = load_state(&path).unwrap_err();
    assert!(matches!(err, Error::Parse(_)), "{err}");
}

fn raw_container(header: &str, payload: &[u8]) -> Vec<u8> {
    let mut bytes = (header.len() as u64).to_le_bytes().to_vec();
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

#[test]
fn huge_data_offsets_are_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.safetensors");
    let header = format!(
        r#"{{"data":{{"dtype":"F64","shape":[1,1],"data_offsets":[{m},{m}]}}}}"#,
        m = u64::MAX
    );
    std::fs::write(&path, raw_container(&header, &[0u8; 8])).unwrap();
    let err = load_recording(&path).unwrap_err();
    assert!(matches!(err, Error::Parse(_)), "{err}");
}

#[test]
fn shape_byte_count_mismatch_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.safetensors");
    // Shape claims 2×2 but only one f64 is stored.
    let header = r#"{"data":{"dtype":"F64","shape":[2,2],"data_offsets":[0,8]}}"#;
    std::fs::write(&path, raw_container(header, &1.0f64.to_le_bytes())).unwrap();
    let err = load_recording(&path).unwrap_err();
    assert!(matches!(err, Error::Parse(_)), "{err}");
}

#[test]
fn garbage_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.safetensors");
    std::fs::write(&path, b"not a tensor file").unwrap();
    assert!(matches!(load_recording(&path), Err(Error::Parse(_))));
}
