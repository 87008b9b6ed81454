use std::rc::Rc;

use crate::waypoint_core::route::RouteRecord;

/// 两条匹配链的差异。
///
/// 从根开始逐位比较，第一个不同的位置把两条链切开：
/// - `updated`：共同前缀，原地复用；
/// - `deactivated`：当前链在切点之后的部分，即将离开；
/// - `activated`：目标链在切点之后的部分，即将进入。
#[derive(Debug, Clone, Default)]
pub struct RouteDiff {
    pub updated: Vec<Rc<RouteRecord>>,
    pub deactivated: Vec<Rc<RouteRecord>>,
    pub activated: Vec<Rc<RouteRecord>>,
}

/// 按记录身份（而非内容）比较两条链。
pub fn resolve_queue(current: &[Rc<RouteRecord>], next: &[Rc<RouteRecord>]) -> RouteDiff {
    let split = current
        .iter()
        .zip(next)
        .take_while(|(a, b)| Rc::ptr_eq(a, b))
        .count();

    RouteDiff {
        updated: next[..split].to_vec(),
        deactivated: current[split..].to_vec(),
        activated: next[split..].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::waypoint_core::route::{RouteConfig, RouteTable};

    fn paths(records: &[Rc<RouteRecord>]) -> Vec<String> {
        records.iter().map(|r| r.path.clone()).collect()
    }

    #[test]
    fn diff_partitions_both_chains() {
        let table = RouteTable::new(&[RouteConfig::new("/a")
            .child(RouteConfig::new("b").child(RouteConfig::new("c")))
            .child(RouteConfig::new("d"))])
        .unwrap();
        let abc = table.matched_chain(&table.by_path("/a/b/c").unwrap());
        let ad = table.matched_chain(&table.by_path("/a/d").unwrap());

        let diff = resolve_queue(&abc, &ad);
        assert_eq!(paths(&diff.updated), ["/a"]);
        assert_eq!(paths(&diff.deactivated), ["/a/b", "/a/b/c"]);
        assert_eq!(paths(&diff.activated), ["/a/d"]);

        // updated 同时是两条链的前缀，三部分合起来恰好覆盖两条链
        assert_eq!(diff.updated.len() + diff.deactivated.len(), abc.len());
        assert_eq!(diff.updated.len() + diff.activated.len(), ad.len());
    }

    #[test]
    fn diff_against_empty_chain() {
        let table = RouteTable::new(&[RouteConfig::new("/x")]).unwrap();
        let x = table.matched_chain(&table.by_path("/x").unwrap());

        let entering = resolve_queue(&[], &x);
        assert!(entering.updated.is_empty());
        assert_eq!(paths(&entering.activated), ["/x"]);

        let same = resolve_queue(&x, &x);
        assert_eq!(paths(&same.updated), ["/x"]);
        assert!(same.activated.is_empty() && same.deactivated.is_empty());
    }
}
