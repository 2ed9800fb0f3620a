//! Grouped-rows walkthrough: classify rows of a virtualized grid into groups,
//! then keep the classification valid while rows are inserted and removed.

use runtable::IndexToValueTable;

fn dump(label: &str, groups: &IndexToValueTable<&str>) {
    println!("{label}:");
    for run in groups {
        println!(
            "  rows {:>3}..={:<3} -> {}",
            run.lower_bound, run.upper_bound, run.value
        );
    }
    println!("  ({} rows in {} runs)\n", groups.index_count(), groups.range_count());
}

fn main() {
    let mut groups = IndexToValueTable::new();

    // Initial classification of 30 rows.
    groups.add_values(0, 12, "Europe").unwrap();
    groups.add_values(12, 10, "Asia").unwrap();
    groups.add_values(22, 8, "Americas").unwrap();
    dump("initial", &groups);

    // Five rows arrive inside the Asia group.
    groups.insert_indexes_and_values(15, 5, "Asia").unwrap();
    dump("after inserting 5 Asia rows at 15", &groups);

    // A filter hides the first three Europe rows: their group association is
    // dropped but row numbers stay put.
    groups.remove_values(0, 3).unwrap();
    dump("after clearing rows 0..=2", &groups);

    // The backing collection deletes rows 10..=16, shifting everything above.
    groups.remove_indexes_and_values(10, 7).unwrap();
    dump("after deleting rows 10..=16", &groups);

    // Navigation over the compressed form.
    println!("row 9 group:        {:?}", groups.value_at(9));
    println!("first unmapped row: {}", groups.next_gap(0));
    println!("Asia rows in 0..=27: {}", groups.index_count_of_value(0, 27, &"Asia"));
    println!("covered rows:       {:?}", groups.indexes().collect::<Vec<_>>());
}
