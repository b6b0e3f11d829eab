use rand::{Rng, SeedableRng, rngs::StdRng};
use divan::{Divan, Bencher, black_box};
use pathset::PathTrieSet;
use pathset::serialization::{deserialize, serialize};
use pathset::path_serialization::{deserialize_paths_, serialize_paths_};

fn make_keys(count: usize, rand_seed: u64) -> Vec<Vec<u8>> {
  let mut rng = StdRng::seed_from_u64(rand_seed);
  (0..count).map(|_| {
    let len = rng.random_range(4..32);
    (0..len).map(|_| rng.random_range(b'a'..b'k')).collect()
  }).collect()
}

#[divan::bench(args = [1000, 100000])]
fn tree_serialize(bencher: Bencher, n: usize) {
  let set = PathTrieSet::from_paths(make_keys(n, 1));
  bencher.bench_local(|| {
    black_box(serialize(black_box(&set)));
  });
}

#[divan::bench(args = [1000, 100000])]
fn tree_deserialize(bencher: Bencher, n: usize) {
  let set = PathTrieSet::from_paths(make_keys(n, 1));
  let bytes = serialize(&set);
  bencher.bench_local(|| {
    let restored = deserialize(black_box(&bytes)).expect("deserialization error");
    assert_eq!(restored.val_count(), set.val_count());
  });
}

#[divan::bench(args = [1000, 100000])]
fn serialize_paths(bencher: Bencher, n: usize) {
  let set = PathTrieSet::from_paths(make_keys(n, 1));
  // don't write directly to file, we want to avoid disk and caching funny business
  let mut out_buffer = vec![];
  bencher.bench_local(|| {
    out_buffer.clear();
    let pathset::path_serialization::SerializationStats { path_count : total_paths , .. } =
      serialize_paths_(&set.read_zipper(), &mut out_buffer).expect("serialization error");
    assert_eq!(total_paths, set.val_count());
  });
  black_box(out_buffer);
}

#[divan::bench(args = [1000, 100000])]
fn deserialize_paths(bencher: Bencher, n: usize) {
  let set = PathTrieSet::from_paths(make_keys(n, 1));
  let mut in_buffer = vec![];
  serialize_paths_(&set.read_zipper(), &mut in_buffer).expect("serialization error");
  bencher.bench_local(|| {
    let (restored, pathset::path_serialization::DeserializationStats { path_count : total_paths , .. }) =
      deserialize_paths_(&in_buffer[..]).expect("deserialization error");
    assert_eq!(total_paths, set.val_count());
    black_box(restored)
  });
}

fn main() {
  // Run registered benchmarks.
  let divan = Divan::from_args()
    .sample_count(50);

  divan.main();
}
