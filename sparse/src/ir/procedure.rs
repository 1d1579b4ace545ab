use anyhow::Context;

use crate::collection::indexed::Indexed;
use crate::collection::iter::Iter;
use crate::collection::sparse_collection::{CollectionStats, SparseCollection};
use crate::ir::value::{Opcode, Value};
use crate::side::index_map::IndexMap;
use crate::side::index_set::IndexSet;

/// A function body whose values live in a [`SparseCollection`] and refer to each
/// other by slot index.
#[derive(Debug, Default)]
pub struct Procedure {
    values: SparseCollection<Value>,
}

impl Procedure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_value(&mut self, opcode: Opcode, children: Vec<usize>) -> anyhow::Result<usize> {
        if children.len() != opcode.arity() {
            anyhow::bail!(
                "{:?} takes {} children, got {}",
                opcode,
                opcode.arity(),
                children.len()
            )
        }
        if let Some(child) = children.iter().find(|&&c| !self.values.contains(c)) {
            anyhow::bail!("child @{} is not a live value", child)
        }

        let value = self.values.add_new(Value::new(opcode, children));
        Ok(value.slot_index())
    }

    pub fn add_const(&mut self, constant: i64) -> usize {
        self.values
            .add_new(Value::new(Opcode::Const(constant), Vec::new()))
            .slot_index()
    }

    pub fn clone_value(&mut self, index: usize) -> anyhow::Result<usize> {
        let source = self
            .values
            .get(index)
            .with_context(|| format!("cloning @{}", index))?
            .clone();
        Ok(self.values.clone_and_add(&source).slot_index())
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> Iter<'_, Value> {
        self.values.iter()
    }

    pub fn stats(&self) -> CollectionStats {
        self.values.stats()
    }

    pub fn uses(&self, index: usize) -> Vec<usize> {
        self.values
            .iter()
            .filter(|value| value.children.contains(&index))
            .map(Value::index)
            .collect()
    }

    pub fn delete_value(&mut self, index: usize) -> anyhow::Result<Value> {
        let users = self.uses(index);
        if !users.is_empty() {
            anyhow::bail!("@{} still used by {:?}", index, users)
        }
        let value = self.values.checked_remove(index)?;
        Ok(*value)
    }

    /// Deletes every value not reachable from `roots`. Returns how many were deleted.
    pub fn reset_reachability(&mut self, roots: &[usize]) -> usize {
        let mut live = IndexSet::with_capacity(self.values.size());
        let mut worklist: Vec<usize> = roots
            .iter()
            .copied()
            .filter(|&root| self.values.contains(root))
            .collect();

        while let Some(index) = worklist.pop() {
            if !live.add_index(index) {
                continue;
            }
            if let Some(value) = self.values.get(index) {
                worklist.extend(value.children.iter().copied());
            }
        }

        let dead: Vec<usize> = self
            .values
            .iter()
            .filter(|value| !live.contains(*value))
            .map(Value::index)
            .collect();
        for index in &dead {
            self.values.remove(*index);
        }
        dead.len()
    }

    /// Compacts value indices and rewrites child references to follow the moves.
    pub fn pack(&mut self) {
        let mut remap: Vec<usize> = (0..self.values.size()).collect();
        self.values.pack_indices_with(|old, new| remap[old] = new);
        for value in self.values.iter_mut() {
            for child in value.children.iter_mut() {
                *child = remap[*child];
            }
        }
    }

    pub fn evaluate(&self, index: usize) -> anyhow::Result<i64> {
        let mut memo = IndexMap::with_collection(&self.values);
        self.evaluate_into(index, &mut memo)
    }

    /// Results for every live value, keyed by slot index.
    pub fn evaluate_all(&self) -> anyhow::Result<IndexMap<i64>> {
        let mut memo = IndexMap::with_collection(&self.values);
        for value in self.values.iter() {
            self.evaluate_into(value.index(), &mut memo)?;
        }
        Ok(memo)
    }

    fn evaluate_into(&self, root: usize, memo: &mut IndexMap<i64>) -> anyhow::Result<i64> {
        let mut stack = vec![(root, false)];

        while let Some((index, ready)) = stack.pop() {
            if memo.entry_at(index).is_some() {
                continue;
            }
            let value = self
                .values
                .get(index)
                .with_context(|| format!("evaluating missing value @{}", index))?;

            if !ready {
                stack.push((index, true));
                stack.extend(
                    value
                        .children
                        .iter()
                        .filter(|&&child| memo.entry_at(child).is_none())
                        .map(|&child| (child, false)),
                );
                continue;
            }

            let mut args = Vec::with_capacity(value.children.len());
            for &child in &value.children {
                let arg = memo
                    .entry_at(child)
                    .copied()
                    .with_context(|| format!("@{} used by @{} was not evaluated", child, index))?;
                args.push(arg);
            }

            let result = match value.opcode {
                Opcode::Const(c) => c,
                Opcode::Add => args[0].wrapping_add(args[1]),
                Opcode::Mul => args[0].wrapping_mul(args[1]),
                Opcode::Neg => args[0].wrapping_neg(),
                Opcode::Return => args[0],
            };
            memo.insert(value, result);
        }

        memo.entry_at(root)
            .copied()
            .with_context(|| format!("evaluating missing value @{}", root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> anyhow::Result<(Procedure, usize)> {
        let mut procedure = Procedure::new();
        let two = procedure.add_const(2);
        let three = procedure.add_const(3);
        let sum = procedure.add_value(Opcode::Add, vec![two, three])?;
        let neg = procedure.add_value(Opcode::Neg, vec![sum])?;
        let ret = procedure.add_value(Opcode::Return, vec![neg])?;
        Ok((procedure, ret))
    }

    #[test]
    fn evaluates_expression_tree() -> anyhow::Result<()> {
        let (procedure, ret) = sample()?;
        assert_eq!(procedure.evaluate(ret)?, -5);
        let all = procedure.evaluate_all()?;
        assert_eq!(all.entry_at(2), Some(&5));
        Ok(())
    }

    #[test]
    fn evaluates_deep_chain_without_recursion() -> anyhow::Result<()> {
        let mut procedure = Procedure::new();
        let mut acc = procedure.add_const(1);
        for _ in 0..100_000 {
            acc = procedure.add_value(Opcode::Neg, vec![acc])?;
        }
        assert_eq!(procedure.evaluate(acc)?, 1);

        let all = procedure.evaluate_all()?;
        assert_eq!(all.entry_at(1), Some(&-1));
        assert_eq!(all.entry_at(acc), Some(&1));
        Ok(())
    }

    #[test]
    fn evaluates_shared_children() -> anyhow::Result<()> {
        let mut procedure = Procedure::new();
        let three = procedure.add_const(3);
        let square = procedure.add_value(Opcode::Mul, vec![three, three])?;
        let twice = procedure.add_value(Opcode::Add, vec![square, square])?;
        assert_eq!(procedure.evaluate(twice)?, 18);
        Ok(())
    }

    #[test]
    fn evaluate_reports_missing_values() -> anyhow::Result<()> {
        let (mut procedure, ret) = sample()?;
        procedure.delete_value(ret)?;

        let err = procedure.evaluate(ret).unwrap_err();
        assert!(err.to_string().contains("missing value @4"));
        assert!(procedure.evaluate(1_000).is_err());
        assert!(procedure.evaluate(usize::MAX).is_err());
        assert_eq!(procedure.evaluate(3)?, -5);
        Ok(())
    }

    #[test]
    fn rejects_bad_children() {
        let mut procedure = Procedure::new();
        let one = procedure.add_const(1);
        assert!(procedure.add_value(Opcode::Add, vec![one]).is_err());
        assert!(procedure.add_value(Opcode::Neg, vec![4]).is_err());
    }

    #[test]
    fn delete_refuses_used_values() -> anyhow::Result<()> {
        let (mut procedure, ret) = sample()?;
        assert!(procedure.delete_value(0).is_err());
        assert_eq!(procedure.uses(0), vec![2]);

        let deleted = procedure.delete_value(ret)?;
        assert_eq!(deleted.opcode, Opcode::Return);
        assert!(procedure.delete_value(ret).is_err());
        Ok(())
    }

    #[test]
    fn reachability_then_pack_rewrites_children() -> anyhow::Result<()> {
        let mut procedure = Procedure::new();
        let dead_a = procedure.add_const(100);
        let dead_b = procedure.add_value(Opcode::Neg, vec![dead_a])?;
        let seven = procedure.add_const(7);
        let six = procedure.add_const(6);
        let product = procedure.add_value(Opcode::Mul, vec![seven, six])?;
        let ret = procedure.add_value(Opcode::Return, vec![product])?;
        assert_eq!((dead_a, dead_b), (0, 1));

        assert_eq!(procedure.reset_reachability(&[ret]), 2);
        assert_eq!(procedure.stats().free, 2);

        procedure.pack();
        let stats = procedure.stats();
        assert_eq!((stats.size, stats.live, stats.free), (4, 4, 0));

        let ret = procedure
            .values()
            .find(|value| value.opcode == Opcode::Return)
            .map(Value::index)
            .unwrap();
        assert_eq!(procedure.evaluate(ret)?, 42);
        for value in procedure.values() {
            assert!(value.children.iter().all(|&c| procedure.value(c).is_some()));
        }
        Ok(())
    }

    #[test]
    fn clone_value_gets_fresh_slot() -> anyhow::Result<()> {
        let (mut procedure, _) = sample()?;
        let copy = procedure.clone_value(2)?;
        assert_eq!(copy, 5);
        assert_eq!(procedure.evaluate(copy)?, 5);
        assert!(procedure.clone_value(40).is_err());
        Ok(())
    }
}
