use crate::error::Error;
use crate::ir::{TempId, Tree};

/// Numbers every non-root node `t1, t2, ...` in pre-order and returns the
/// count. A tree can only be named once.
pub fn assign_temp_ids(tree: &mut Tree) -> Result<usize, Error> {
    if tree.named {
        return Err(Error::AlreadyNamed);
    }
    let mut count = 0u32;
    for id in tree.pre_order() {
        if id == tree.root() {
            continue;
        }
        count += 1;
        tree.node_mut(id).temp = Some(TempId(count));
    }
    tree.named = true;
    log::debug!("named {} values", count);
    Ok(count as usize)
}
