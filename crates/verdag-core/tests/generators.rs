use proptest::prelude::*;
use verdag_core::{ReleaseVersion, StaticProvider};

/// A main line `1.0.0, 1.1.0, …` where the gap after each mainline release
/// may hold a side branch of snapshots that merges into the next release.
#[derive(Debug, Clone)]
pub struct Layout {
    pub side_lengths: Vec<usize>,
}

impl Layout {
    pub fn mainline(i: usize) -> ReleaseVersion {
        ReleaseVersion::parse(format!("1.{i}"), &format!("1.{i}.0")).unwrap()
    }

    pub fn side(i: usize, j: usize) -> ReleaseVersion {
        ReleaseVersion::parse(format!("1.{i}.1-pre{j}"), &format!("1.{i}.1-pre.{j}")).unwrap()
    }

    /// Number of mainline releases; the last gap is never filled.
    pub fn mainline_len(&self) -> usize {
        self.side_lengths.len() + 1
    }

    pub fn versions(&self) -> Vec<ReleaseVersion> {
        let mut all: Vec<_> = (0..self.mainline_len()).map(Self::mainline).collect();
        for (i, len) in self.side_lengths.iter().enumerate() {
            all.extend((0..*len).map(|j| Self::side(i, j)));
        }
        all
    }

    /// The provider, with versions registered in forward or reverse order.
    pub fn provider(&self, reversed: bool) -> StaticProvider<ReleaseVersion> {
        let mut provider = StaticProvider::new("generated");
        let mut steps: Vec<Box<dyn Fn(StaticProvider<ReleaseVersion>) -> StaticProvider<ReleaseVersion>>> =
            Vec::new();

        steps.push(Box::new(|p| p.version(Self::mainline(0))));
        for (i, len) in self.side_lengths.iter().copied().enumerate() {
            for j in 0..len {
                steps.push(Box::new(move |p| {
                    let p = p.side_version(Self::side(i, j));
                    if j == 0 {
                        p
                    } else {
                        p.parents(Self::side(i, j), vec![Self::side(i, j - 1)])
                    }
                }));
            }
            steps.push(Box::new(move |p| {
                let mut parents = vec![Self::mainline(i)];
                if len > 0 {
                    parents.push(Self::side(i, len - 1));
                }
                p.version_with_parents(Self::mainline(i + 1), parents)
            }));
        }

        if reversed {
            steps.reverse();
        }
        for step in steps {
            provider = step(provider);
        }
        provider
    }
}

pub fn arb_layout() -> impl Strategy<Value = Layout> {
    prop::collection::vec(0usize..4, 1..8).prop_map(|side_lengths| Layout { side_lengths })
}

/// A keep-mask over `Layout::versions()` that always keeps the first root.
pub fn arb_mask(len: usize) -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), len).prop_map(|mut mask| {
        mask[0] = true;
        mask
    })
}
