use rand::{Rng, SeedableRng, rngs::StdRng};
use divan::{Divan, Bencher, black_box};

use pathset::{PathTrieSet, Zipper};

fn main() {
    // Run registered benchmarks.
    let divan = Divan::from_args()
        .sample_count(1000);

    divan.main();
}

fn make_keys(count: usize, rand_seed: u64) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(rand_seed);
    (0..count).map(|_| {
        let len = rng.random_range(4..24);
        (0..len).map(|_| rng.random()).collect()
    }).collect()
}

#[divan::bench(args = [1000, 10000, 100000])]
fn to_next_val(bencher: Bencher, n: usize) {
    let set = PathTrieSet::from_paths(make_keys(n, 1));

    bencher.bench_local(|| {
        let mut rz = set.read_zipper();
        let mut count = 0;
        while rz.to_next_val() {
            count += 1;
        }
        assert_eq!(count, set.val_count());
    });
}

#[divan::bench(args = [1000, 10000, 100000])]
fn descend_to(bencher: Bencher, n: usize) {
    let keys = make_keys(n, 1);
    let set = PathTrieSet::from_paths(&keys);

    bencher.bench_local(|| {
        let mut rz = set.read_zipper();
        for key in keys.iter() {
            assert!(rz.descend_to(black_box(key)));
            rz.reset();
        }
    });
}

#[divan::bench(args = [1000, 10000, 100000])]
fn contains(bencher: Bencher, n: usize) {
    let keys = make_keys(n, 1);
    let set = PathTrieSet::from_paths(&keys);

    bencher.bench_local(|| {
        for key in keys.iter() {
            assert!(set.contains(black_box(key)));
        }
    });
}

#[divan::bench(args = [64, 1024])]
fn traverse_batches(bencher: Bencher, batch: usize) {
    let set = PathTrieSet::from_paths(make_keys(10000, 1));

    bencher.bench_local(|| {
        let mut it = set.iter();
        let mut total = 0;
        loop {
            let paths = it.next_batch(batch, usize::MAX);
            if paths.is_empty() { break }
            total += paths.len();
        }
        assert_eq!(total, set.val_count());
    });
}
