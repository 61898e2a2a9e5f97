#![allow(unused_crate_dependencies)]
use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use utils::fuzzy::Search;

fn bench_search(c: &mut Criterion) {
    let names = all_names();
    let search = create_search(&names);
    let mut index = 0usize;

    c.bench_function("search_exact", |b| {
        b.iter(|| {
            let name = &names[index];
            index = index.wrapping_add(1) % names.len();

            search.search(black_box(name), 3)
        })
    });

    c.bench_function("search_nonsense", |b| {
        b.iter(|| {
            let name = "dhbwuadsrasfdv";
            search.search(black_box(name), 3)
        })
    });
}

fn all_names() -> Vec<String> {
    const WORDS: &[&str] = &[
        "Super", "Mario", "Zelda", "Kart", "Deluxe", "Party", "Legend", "Wild",
        "Knight", "Odyssey", "Splatoon", "Xenoblade", "Chronicles", "Edition",
    ];

    // deterministic pseudo-titles of 2 to 5 words
    (0..4000usize)
        .map(|i| {
            let count = 2 + i % 4;
            (0..count)
                .map(|w| WORDS[(i * 7 + w * 13) % WORDS.len()])
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn create_search(names: &[String]) -> Search<()> {
    let mut search = Search::<()>::new();

    for n in names {
        search.insert(n, ());
    }

    search.shrink_to_fit();
    search
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
