use crate::types::LabelMap;

pub const DEFAULT_MIN_SIZE: usize = 5;

/// Keeps regions whose pixel count reaches a minimum size.
///
/// The label map is left untouched; rejected ids are simply not reported.
#[derive(Debug, Clone)]
pub struct SizeFilter {
    pub min_size: usize,
}

impl Default for SizeFilter {
    fn default() -> Self {
        Self { min_size: DEFAULT_MIN_SIZE }
    }
}

impl SizeFilter {
    /// Surviving label ids in ascending order
    pub fn surviving(&self, labels: &LabelMap) -> Vec<u32> {
        (1..=labels.label_count())
            .filter(|&id| labels.pixel_count(id) >= self.min_size)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algorithms::labeling::UnionFindLabeler,
        traits::ComponentLabeler,
        types::BinaryMask,
    };

    /// A row of horizontal bars with the given lengths, separated by gaps
    fn bars(lengths: &[u32]) -> BinaryMask {
        let width = lengths.iter().map(|l| l + 1).sum::<u32>();
        let mut mask = BinaryMask::new(width, 1);
        let mut x = 0;
        for &len in lengths {
            for i in 0..len {
                mask.set(x + i, 0, true);
            }
            x += len + 1;
        }
        mask
    }

    #[test]
    fn test_min_size_is_inclusive() {
        let labels = UnionFindLabeler.label(&bars(&[5, 4]));
        let filter = SizeFilter::default();
        assert_eq!(filter.surviving(&labels), vec![1]);
    }

    #[test]
    fn test_label_map_is_not_mutated() {
        let labels = UnionFindLabeler.label(&bars(&[2, 6, 1, 7]));
        let before = labels.clone();
        let surviving = SizeFilter { min_size: 3 }.surviving(&labels);
        assert_eq!(surviving, vec![2, 4]);
        assert_eq!(labels, before);
        assert_eq!(labels.label_count(), 4);
    }

    #[test]
    fn test_zero_min_size_keeps_everything() {
        let labels = UnionFindLabeler.label(&bars(&[1, 1, 1]));
        assert_eq!(SizeFilter { min_size: 0 }.surviving(&labels), vec![1, 2, 3]);
    }
}
