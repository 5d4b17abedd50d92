//! Object 单元测试
//!
//! 测试浅拷贝、深拷贝、写时复制、释放回调与默认分发行为


use std::cell::Cell;
use std::rc::Rc;

use crate::runtime::memory::MemoryBlock;
use crate::runtime::object::{Object, TypeOps};
use crate::runtime::registry::{TypeId, TypeRegistry};

/// Counts release callbacks and payload clones
#[derive(Default)]
struct Counting {
    releases: Rc<Cell<usize>>,
    clones: Rc<Cell<usize>>,
}

impl TypeOps for Counting {
    fn clone_payload(
        &self,
        payload: &MemoryBlock,
    ) -> MemoryBlock {
        self.clones.set(self.clones.get() + 1);
        payload.deep_clone()
    }

    fn release(
        &self,
        _payload: &MemoryBlock,
    ) {
        self.releases.set(self.releases.get() + 1);
    }
}

const COUNTING: TypeId = TypeId::client(100);

fn counting_registry() -> (TypeRegistry, Rc<Cell<usize>>, Rc<Cell<usize>>) {
    let ops = Counting::default();
    let releases = Rc::clone(&ops.releases);
    let clones = Rc::clone(&ops.clones);
    let reg = TypeRegistry::new();
    reg.register(COUNTING, ops);
    (reg, releases, clones)
}

fn counting_object(
    reg: &TypeRegistry,
    bytes: &[u8],
) -> Object {
    Object::new_in(reg, COUNTING, MemoryBlock::from_bytes(bytes))
}
