//! Combination enumeration over video blocks.
//!
//! A combination picks exactly one source URL from every video block. Blocks
//! are ordered by ascending name, so column `i` of every combination always
//! comes from the same block, and combinations are produced in odometer
//! order (the last block varies fastest). Output names depend on the
//! enumeration index, so this order must stay stable.

use serde::{Deserialize, Serialize};

/// One selection of exactly one URL per video block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combination {
    /// Zero-based position in the enumeration order
    pub index: usize,
    /// Source URLs, one per block, in ascending block-name order
    pub urls: Vec<String>,
}

impl Combination {
    /// Output file name for this combination, e.g. `promo_combo_3.mp4`.
    pub fn file_name(&self, job_name: &str, extension: &str) -> String {
        output_file_name(job_name, self.index, extension)
    }
}

/// Most combinations a single job may render.
pub const MAX_COMBINATIONS: usize = 10_000;

/// Number of combinations for the given block sizes, or `None` if the
/// product does not fit in `usize`. No blocks means no combinations.
pub fn combination_count<I>(block_sizes: I) -> Option<usize>
where
    I: IntoIterator<Item = usize>,
{
    let mut total: Option<usize> = None;
    for size in block_sizes {
        total = Some(total.unwrap_or(1).checked_mul(size)?);
    }
    Some(total.unwrap_or(0))
}

/// Build the output file name `<job>_combo_<index>.<ext>`.
pub fn output_file_name(job_name: &str, index: usize, extension: &str) -> String {
    format!("{}_combo_{}.{}", job_name, index, extension)
}

/// Build the remote object key `<job>/<file_name>`.
pub fn remote_key(job_name: &str, file_name: &str) -> String {
    format!("{}/{}", job_name, file_name)
}

/// Lazy, restartable Cartesian product over named video blocks.
#[derive(Debug, Clone)]
pub struct ComboGenerator {
    block_names: Vec<String>,
    columns: Vec<Vec<String>>,
    total: usize,
}

impl ComboGenerator {
    /// Create a generator from `(block name, urls)` pairs in any order.
    ///
    /// Every block is expected to hold at least one URL; an empty block (or
    /// an empty block set) yields no combinations.
    pub fn new<I, K, U>(blocks: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<U>)>,
        K: Into<String>,
        U: Into<String>,
    {
        let mut named: Vec<(String, Vec<String>)> = blocks
            .into_iter()
            .map(|(name, urls)| (name.into(), urls.into_iter().map(Into::into).collect()))
            .collect();
        named.sort_by(|a, b| a.0.cmp(&b.0));

        // Validated jobs stay under MAX_COMBINATIONS. Past usize::MAX only a
        // prefix is reachable, and every index in it still decodes exactly.
        let total = combination_count(named.iter().map(|(_, urls)| urls.len()))
            .unwrap_or(usize::MAX);

        let (block_names, columns) = named.into_iter().unzip();

        Self {
            block_names,
            columns,
            total,
        }
    }

    /// Block names in column order.
    pub fn block_names(&self) -> &[String] {
        &self.block_names
    }

    /// Number of combinations, without iterating.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Combination at a given enumeration index.
    pub fn get(&self, index: usize) -> Option<Combination> {
        if index >= self.total {
            return None;
        }

        let mut urls = vec![String::new(); self.columns.len()];
        let mut rest = index;
        for (slot, column) in urls.iter_mut().zip(&self.columns).rev() {
            let len = column.len();
            *slot = column[rest % len].clone();
            rest /= len;
        }

        Some(Combination { index, urls })
    }

    /// Iterate from the first combination. Each call starts over.
    pub fn iter(&self) -> Combinations<'_> {
        Combinations {
            generator: self,
            next: 0,
        }
    }
}

impl<'a> IntoIterator for &'a ComboGenerator {
    type Item = Combination;
    type IntoIter = Combinations<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the combinations of a [`ComboGenerator`].
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    generator: &'a ComboGenerator,
    next: usize,
}

impl Iterator for Combinations<'_> {
    type Item = Combination;

    fn next(&mut self) -> Option<Self::Item> {
        let combo = self.generator.get(self.next)?;
        self.next += 1;
        Some(combo)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.generator.total.saturating_sub(self.next);
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.next = self.next.saturating_add(n);
        self.next()
    }
}

impl ExactSizeIterator for Combinations<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_two_block_example() {
        let gen = ComboGenerator::new(vec![("B", urls(&["b1"])), ("A", urls(&["a1", "a2"]))]);

        let combos: Vec<_> = gen.iter().collect();
        assert_eq!(combos.len(), 2);
        assert_eq!(combos[0].urls, urls(&["a1", "b1"]));
        assert_eq!(combos[1].urls, urls(&["a2", "b1"]));
        assert_eq!(combos[0].file_name("job", "mp4"), "job_combo_0.mp4");
        assert_eq!(combos[1].file_name("job", "mp4"), "job_combo_1.mp4");
    }

    #[test]
    fn test_count_is_product_of_lengths() {
        let gen = ComboGenerator::new(vec![
            ("block1", urls(&["a", "b", "c"])),
            ("block2", urls(&["d", "e"])),
            ("block3", urls(&["f", "g", "h", "i"])),
        ]);

        assert_eq!(gen.total(), 24);
        assert_eq!(gen.iter().len(), 24);

        let combos: Vec<_> = gen.iter().collect();
        assert_eq!(combos.len(), 24);
        assert!(combos.iter().all(|c| c.urls.len() == 3));

        // Indices follow enumeration order
        for (i, combo) in combos.iter().enumerate() {
            assert_eq!(combo.index, i);
        }

        // Every combination is distinct
        let mut seen: Vec<_> = combos.iter().map(|c| c.urls.clone()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 24);
    }

    #[test]
    fn test_columns_follow_block_name_order() {
        let gen = ComboGenerator::new(vec![
            ("zeta", urls(&["z1"])),
            ("alpha", urls(&["a1", "a2"])),
            ("mid", urls(&["m1"])),
        ]);

        assert_eq!(gen.block_names(), &["alpha", "mid", "zeta"]);
        for combo in gen.iter() {
            assert!(combo.urls[0].starts_with('a'));
            assert_eq!(combo.urls[1], "m1");
            assert_eq!(combo.urls[2], "z1");
        }
    }

    #[test]
    fn test_last_block_varies_fastest() {
        let gen = ComboGenerator::new(vec![("a", urls(&["a1", "a2"])), ("b", urls(&["b1", "b2"]))]);
        let combos: Vec<_> = gen.iter().map(|c| c.urls).collect();
        assert_eq!(
            combos,
            vec![
                urls(&["a1", "b1"]),
                urls(&["a1", "b2"]),
                urls(&["a2", "b1"]),
                urls(&["a2", "b2"]),
            ]
        );
    }

    #[test]
    fn test_iteration_is_restartable() {
        let gen = ComboGenerator::new(vec![("a", urls(&["a1", "a2"])), ("b", urls(&["b1"]))]);

        let mut first = gen.iter();
        first.next();

        let again: Vec<_> = gen.iter().collect();
        assert_eq!(again.len(), 2);
        assert_eq!(again[0].index, 0);
    }

    #[test]
    fn test_empty_inputs_yield_nothing() {
        let none: Vec<(String, Vec<String>)> = Vec::new();
        assert_eq!(ComboGenerator::new(none).iter().count(), 0);

        let gen = ComboGenerator::new(vec![("a", urls(&["a1"])), ("b", Vec::<String>::new())]);
        assert_eq!(gen.total(), 0);
        assert!(gen.get(0).is_none());
    }

    #[test]
    fn test_combination_count_is_checked() {
        assert_eq!(combination_count([2, 3, 4]), Some(24));
        assert_eq!(combination_count([5, 0]), Some(0));
        assert_eq!(combination_count(std::iter::empty()), Some(0));
        assert_eq!(combination_count(vec![10; 20]), None);
    }

    #[test]
    fn test_overflowing_generator_still_decodes_prefix() {
        let blocks: Vec<(String, Vec<String>)> = (0..20)
            .map(|b| {
                let name = format!("block{:02}", b);
                let sources = (0..10).map(|i| format!("https://cdn/{}/{}.mp4", name, i)).collect();
                (name, sources)
            })
            .collect();
        let gen = ComboGenerator::new(blocks);

        assert_eq!(gen.total(), usize::MAX);
        let first = gen.get(0).unwrap();
        assert!(first.urls.iter().all(|u| u.ends_with("/0.mp4")));
        let second = gen.get(1).unwrap();
        assert_eq!(second.urls[19], "https://cdn/block19/1.mp4");
        assert_eq!(second.urls[..19], first.urls[..19]);
    }

    #[test]
    fn test_remote_key() {
        assert_eq!(remote_key("promo", "promo_combo_2.mp4"), "promo/promo_combo_2.mp4");
    }
}
