//! A flat, streamable encoding that writes out every path in full: `(len:u32 le, bytes)*`.  It is larger
//! than the [tree encoding](crate::serialization) for most sets, but can be produced and consumed one
//! path at a time.
use std::io::{Read, Write};
use tracing::debug;
use crate::trie_set::PathTrieSet;
use crate::zipper::ReadZipper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializationStats {
  pub bytes_out  : usize,
  pub path_count : usize
}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeserializationStats {
  pub bytes_in   : usize,
  pub path_count : usize
}

pub fn serialize_paths_<W: std::io::Write>(rz: &ReadZipper, target: &mut W) -> std::io::Result<SerializationStats> {
  serialize_paths(rz, target, |_, _| {})
}
/// Serialize all paths under the focus of `rz`, relative to the focus
/// Returns the total serialized bytes, and total number of paths
pub fn serialize_paths<W: Write, F: FnMut(usize, &[u8])>(rz: &ReadZipper, target: &mut W, mut fv: F) -> std::io::Result<SerializationStats> {
  let mut total_paths : usize = 0;
  let mut bytes_out : usize = 0;
  for p in rz.path_iter() {
    fv(total_paths, &p);
    let l = u32::try_from(p.len()).map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "path longer than u32::MAX bytes"))?;
    target.write_all(&l.to_le_bytes())?;
    target.write_all(&p)?;
    bytes_out += 4 + p.len();
    total_paths += 1;
  }
  debug!(paths = total_paths, bytes = bytes_out, "serialized path list");

  Ok(SerializationStats {
    bytes_out  : bytes_out,
    path_count : total_paths
  })
}

pub fn deserialize_paths_<R: std::io::Read>(source: R) -> std::io::Result<(PathTrieSet, DeserializationStats)> {
  deserialize_paths(source, |_, _| true)
}

/// Deserialize bytes that were serialized by `serialize_paths`
/// `fv` is called with the index and bytes of each path, and the path is only kept if it returns `true`
/// Returns the new set, the total bytes read, and the total number of paths read
pub fn deserialize_paths<R: Read, F: FnMut(usize, &[u8]) -> bool>(mut source: R, mut fv: F) -> std::io::Result<(PathTrieSet, DeserializationStats)> {
  let mut input = vec![];
  source.read_to_end(&mut input)?;

  let mut paths = vec![];
  let mut pos = 0usize;
  let mut total_paths : usize = 0;
  while pos < input.len() {
    let Some(lbuf) = input.get(pos..pos+4) else {
      return Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated path length"))
    };
    let l = u32::from_le_bytes([lbuf[0], lbuf[1], lbuf[2], lbuf[3]]) as usize;
    pos += 4;
    let Some(p) = input.get(pos..pos+l) else {
      return Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated path"))
    };
    if fv(total_paths, p) { paths.push(p) }
    pos += l;
    total_paths += 1;
  }
  debug!(paths = total_paths, bytes = input.len(), "deserialized path list");

  Ok((PathTrieSet::from_paths(paths), DeserializationStats {
    bytes_in   : input.len(),
    path_count : total_paths
  }))
}

#[cfg(test)]
mod test {
  use crate::zipper::Zipper;
  use super::*;

  #[test]
  fn path_serialize_deserialize() {
    let rs = ["arrow", "bow", "cannon", "roman", "romane", "romanus", "romulus", "rubens", "ruber", "rubicon", "rubicundus", "rom'i"];
    let btm = PathTrieSet::from_paths(rs);
    let mut v = vec![];
    let stats = serialize_paths_(&btm.read_zipper(), &mut v).unwrap();
    assert_eq!(stats.path_count, rs.len());
    assert_eq!(stats.bytes_out, v.len());
    assert_eq!(v.len(), rs.iter().map(|r| r.len() + 4).sum::<usize>());

    let (restored_btm, de_stats) = deserialize_paths_(v.as_slice()).unwrap();
    assert_eq!(de_stats, DeserializationStats { bytes_in: v.len(), path_count: rs.len() });

    let mut lrz = restored_btm.read_zipper();
    while lrz.to_next_val() {
      assert!(btm.contains(lrz.path()), "{}", std::str::from_utf8(lrz.path()).unwrap());
    }
    assert_eq!(restored_btm, btm);
  }

  #[test]
  fn path_serialize_below_focus() {
    let btm = PathTrieSet::from_paths(["", "rubens", "ruber", "roman"]);
    let mut rz = btm.read_zipper();
    rz.descend_to(b"rub");
    let mut seen = vec![];
    let mut v = vec![];
    serialize_paths(&rz, &mut v, |c, p| { assert_eq!(seen.len(), c); seen.push(p.to_vec()) }).unwrap();
    assert_eq!(seen, vec![b"ens".to_vec(), b"er".to_vec()]);
    assert_eq!(v, [&[3u8, 0, 0, 0][..], &b"ens"[..], &[2, 0, 0, 0][..], &b"er"[..]].concat());

    let (restored, _) = deserialize_paths(v.as_slice(), |_, p| p != b"er").unwrap();
    assert_eq!(restored, PathTrieSet::singleton("ens"));
  }

  #[test]
  fn path_serialize_empty_path_and_empty_set() {
    let mut v = vec![];
    serialize_paths_(&PathTrieSet::singleton("").read_zipper(), &mut v).unwrap();
    assert_eq!(v, vec![0, 0, 0, 0]);
    assert_eq!(deserialize_paths_(v.as_slice()).unwrap().0, PathTrieSet::singleton(""));

    let (empty, stats) = deserialize_paths_(&[0u8; 0][..]).unwrap();
    assert!(empty.is_empty());
    assert_eq!(stats.path_count, 0);
  }

  #[test]
  fn path_deserialize_truncated() {
    for bad in [&[1u8, 0][..], &[3, 0, 0, 0, b'a'][..]] {
      let err = deserialize_paths_(bad).unwrap_err();
      assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }
  }

  #[test]
  fn path_serialize_blow_out_buffer() {
    for zeros in 0..10 {
      let mut rs = vec![];
      for i in 0..400 {
        rs.push(format!("{}{}{}{}", "0".repeat(zeros), i/100, (i/10)%10, i%10))
      }
      let btm = PathTrieSet::from_paths(&rs);

      let mut v = vec![];
      let stats = serialize_paths_(&btm.read_zipper(), &mut v).unwrap();
      assert_eq!(stats.path_count, 400);
      let (restored_btm, _) = deserialize_paths_(v.as_slice()).unwrap();
      assert_eq!(restored_btm, btm);
    }
  }
}
