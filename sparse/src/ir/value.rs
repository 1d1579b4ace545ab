use std::fmt;

use crate::collection::indexed::Indexed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Const(i64),
    Add,
    Mul,
    Neg,
    Return,
}

impl Opcode {
    pub fn arity(self) -> usize {
        match self {
            Opcode::Const(_) => 0,
            Opcode::Neg | Opcode::Return => 1,
            Opcode::Add | Opcode::Mul => 2,
        }
    }
}

/// An SSA value. `children` are slot indices of the values it consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    index: usize,
    pub opcode: Opcode,
    pub children: Vec<usize>,
}

impl Value {
    pub fn new(opcode: Opcode, children: Vec<usize>) -> Self {
        Self {
            index: 0,
            opcode,
            children,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl Indexed for Value {
    fn slot_index(&self) -> usize {
        self.index
    }

    fn set_slot_index(&mut self, index: usize) {
        self.index = index;
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{} = ", self.index)?;
        match self.opcode {
            Opcode::Const(c) => write!(f, "Const({})", c),
            op => {
                let args: Vec<String> = self.children.iter().map(|c| format!("@{}", c)).collect();
                write!(f, "{:?}({})", op, args.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_arity() {
        assert_eq!(Opcode::Const(1).arity(), 0);
        assert_eq!(Opcode::Neg.arity(), 1);
        assert_eq!(Opcode::Return.arity(), 1);
        assert_eq!(Opcode::Add.arity(), 2);
        assert_eq!(Opcode::Mul.arity(), 2);
    }

    #[test]
    fn value_display() {
        let mut constant = Value::new(Opcode::Const(-4), vec![]);
        constant.set_slot_index(2);
        assert_eq!(constant.to_string(), "@2 = Const(-4)");

        let mut sum = Value::new(Opcode::Add, vec![0, 2]);
        sum.set_slot_index(3);
        assert_eq!(sum.to_string(), "@3 = Add(@0, @2)");
    }
}
