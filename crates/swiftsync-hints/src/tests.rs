use crate::file::FILE_MAGIC;
use crate::{Error, HintsFileReader, HintsFileWriter, PayloadEncoding, SessionState, SyncSession};
use bitcoin::hashes::Hash;
use bitcoin::{OutPoint, Txid};
use std::io::Write;
use std::path::PathBuf;

fn temp_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

fn prefix_sums(deltas: &[u32]) -> Vec<u32> {
    let mut acc = 0;
    deltas
        .iter()
        .map(|delta| {
            acc += delta;
            acc
        })
        .collect()
}

fn sample_blocks() -> Vec<(u32, Vec<u32>)> {
    vec![
        (1, prefix_sums(&[0, 3253, 120])),
        (
            3,
            prefix_sums(&[0, 4231, 92385, 53894, 82, 3, 2389453, 92, 2, 23985]),
        ),
        (4, prefix_sums(&[0, 83948, 1111, 12424, 12, 2, 3, 3, 14])),
        (
            2,
            prefix_sums(&[0, 999, 532, 624, 623623, 436134, 32443, 2346, 3, 3564, 234, 122]),
        ),
    ]
}

fn hints_file_roundtrip(encoding: PayloadEncoding) {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "unspents.hints");

    let blocks = sample_blocks();
    let mut writer = HintsFileWriter::create(&path, 4, encoding).unwrap();
    for (height, indices) in &blocks {
        writer.write_next_unspents(*height, indices).unwrap();
    }
    assert_eq!(writer.blocks_written(), 4);
    assert!(writer.size_mb().unwrap() > 0.0);
    writer.close().unwrap();

    let mut reader = HintsFileReader::open(&path).unwrap();
    assert_eq!(reader.stop_height(), 4);
    // Heights were appended out of order; reads are random access.
    for (height, indices) in blocks.iter().rev() {
        assert_eq!(reader.read_block(*height).unwrap(), *indices);
    }

    for missing in [0, 5] {
        assert!(matches!(
            reader.read_block(missing),
            Err(Error::HeightNotPresent(h)) if h == missing
        ));
    }
}

#[test]
fn test_hints_file_roundtrip_delta_list() {
    hints_file_roundtrip(PayloadEncoding::DeltaList);
}

#[test]
fn test_hints_file_roundtrip_elias_fano() {
    hints_file_roundtrip(PayloadEncoding::EliasFano);
}

#[test]
fn test_hints_file_empty_block() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "empty.hints");

    let mut writer = HintsFileWriter::create(&path, 2, PayloadEncoding::EliasFano).unwrap();
    writer.write_next_unspents(1, &[]).unwrap();
    writer.close().unwrap();

    let mut reader = HintsFileReader::open(&path).unwrap();
    assert!(reader.read_block(1).unwrap().is_empty());
    // The second slot was preallocated but never written.
    assert!(matches!(reader.read_block(2), Err(Error::HeightNotPresent(2))));
}

#[test]
fn test_directory_full() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "full.hints");

    let mut writer = HintsFileWriter::create(&path, 1, PayloadEncoding::EliasFano).unwrap();
    writer.write_next_unspents(1, &[0, 4, 9]).unwrap();
    assert!(matches!(
        writer.write_next_unspents(2, &[1]),
        Err(Error::DirectoryFull(1))
    ));
}

#[test]
fn test_open_rejects_bad_magic() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "bad_magic.hints");
    std::fs::write(&path, b"nope\x00\x00\x00\x00\x00").unwrap();

    assert!(matches!(
        HintsFileReader::open(&path),
        Err(Error::MalformedHeader { expected, .. }) if expected == FILE_MAGIC
    ));
}

#[test]
fn test_open_rejects_unknown_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "bad_version.hints");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(&FILE_MAGIC).unwrap();
    file.write_all(&[0x7f]).unwrap();
    file.write_all(&0u32.to_le_bytes()).unwrap();
    drop(file);

    assert!(matches!(
        HintsFileReader::open(&path),
        Err(Error::UnsupportedVersion(0x7f))
    ));
}

fn outpoint(seed: u8, vout: u32) -> OutPoint {
    OutPoint {
        txid: Txid::from_byte_array([seed; 32]),
        vout,
    }
}

/// Two-block chain: block one creates an output that stays unspent and one
/// that block two consumes; block two's own output also stays unspent.
fn write_session_hints(path: &PathBuf) {
    let mut writer = HintsFileWriter::create(path, 2, PayloadEncoding::EliasFano).unwrap();
    writer.write_next_unspents(1, &[0]).unwrap();
    writer.write_next_unspents(2, &[0]).unwrap();
    writer.close().unwrap();
}

#[test]
fn test_session_completes_on_balanced_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "session.hints");
    write_session_hints(&path);

    let mut session = SyncSession::new();
    assert_eq!(session.state(), SessionState::Inactive);

    session
        .arm(true, HintsFileReader::open(&path).unwrap())
        .unwrap();
    assert_eq!(session.state(), SessionState::Armed);
    assert_eq!(session.stop_height(), 2);

    let state = session
        .process_block(1, &[outpoint(1, 0), outpoint(1, 1)], &[])
        .unwrap();
    assert_eq!(state, SessionState::Running);

    let state = session
        .process_block(2, &[outpoint(2, 0)], &[outpoint(1, 1)])
        .unwrap();
    assert_eq!(state, SessionState::Completed);
}

#[test]
fn test_session_fails_on_imbalance() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "corrupt.hints");
    write_session_hints(&path);

    let mut session = SyncSession::new();
    session
        .arm(true, HintsFileReader::open(&path).unwrap())
        .unwrap();

    session
        .process_block(1, &[outpoint(1, 0), outpoint(1, 1)], &[])
        .unwrap();
    // The spend of the second output never arrives.
    let result = session.process_block(2, &[outpoint(2, 0)], &[]);
    assert!(matches!(result, Err(Error::AggregateNonZero { height: 2 })));
    assert_eq!(session.state(), SessionState::Failed);
}

#[test]
fn test_session_requires_genesis_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "genesis.hints");
    write_session_hints(&path);

    let mut session = SyncSession::new();
    let result = session.arm(false, HintsFileReader::open(&path).unwrap());
    assert!(matches!(result, Err(Error::NotFromGenesis)));
    assert_eq!(session.state(), SessionState::Inactive);
}

#[test]
fn test_session_rejects_blocks_while_inactive() {
    let mut session = SyncSession::new();
    assert!(matches!(
        session.process_block(1, &[], &[]),
        Err(Error::InvalidTransition(SessionState::Inactive))
    ));
}
