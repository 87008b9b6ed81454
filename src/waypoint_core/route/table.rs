use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::waypoint_core::component::ComponentSlot;
use crate::waypoint_core::error::ConfigError;
use crate::waypoint_core::location::clean_path;
use crate::waypoint_core::route::{PathPattern, PatternOptions, RouteConfig, RouteRecord};
use crate::waypoint_core::types::RecordId;

/// 路由表：
///
/// - 所有 RouteRecord（arena，下标即 RecordId）
/// - 按优先级排列的 path 列表（通配 `*` 永远在最后）
/// - path -> RecordId 索引
/// - name -> RecordId 索引
///
/// 只增不减：`compile` 可以反复调用追加新配置。
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    records: Vec<Rc<RouteRecord>>,
    path_list: Vec<String>,
    path_map: HashMap<String, RecordId>,
    name_map: HashMap<String, RecordId>,
}

impl RouteTable {
    pub fn new(routes: &[RouteConfig]) -> Result<Self, ConfigError> {
        let mut table = Self::default();
        table.compile(routes, None)?;
        Ok(table)
    }

    /// 追加一批配置。`parent` 给出时作为这批配置的父记录。
    pub fn compile(
        &mut self,
        routes: &[RouteConfig],
        parent: Option<RecordId>,
    ) -> Result<(), ConfigError> {
        for route in routes {
            self.add_route_record(route, parent, None)?;
        }
        self.finish_pass();
        Ok(())
    }

    /// 在名为 `parent_name` 的记录下追加子路由，父记录的每个别名也会得到对应的子路由。
    ///
    /// 父记录不存在时告警并按顶层路由追加。
    pub fn add_route(
        &mut self,
        parent_name: Option<&str>,
        route: RouteConfig,
    ) -> Result<(), ConfigError> {
        let parent = match parent_name {
            Some(name) => {
                let found = self.by_name(name);
                if found.is_none() {
                    warn!("Cannot add a child route to nonexistent parent \"{name}\"");
                }
                found
            }
            None => None,
        };

        self.add_route_record(&route, parent.as_ref().map(|p| p.id), None)?;

        if let Some(parent) = parent {
            let grandparent = parent.parent.and_then(|id| self.get(id)).map(|p| p.path.clone());
            for alias in &parent.alias {
                let alias_path = normalize_path(alias, grandparent.as_deref(), false);
                let Some(alias_record) = self.by_path(&alias_path) else {
                    continue;
                };
                let target = alias_record.match_as.as_deref().unwrap_or(&parent.path);
                let child_path = route.path.as_deref().unwrap_or_default();
                let match_as = clean_path(&format!("{target}/{child_path}"));
                self.add_route_record(&route, Some(alias_record.id), Some(match_as))?;
            }
        }

        self.finish_pass();
        Ok(())
    }

    /// 一轮编译结束：通配记录挪到末尾并检查顶层路径。
    fn finish_pass(&mut self) {
        // 通配记录挪到末尾，彼此相对顺序不变
        let (mut ordered, wildcards): (Vec<String>, Vec<String>) =
            std::mem::take(&mut self.path_list)
                .into_iter()
                .partition(|path| path != "*");
        ordered.extend(wildcards);
        self.path_list = ordered;

        let non_nested: Vec<&str> = self
            .path_list
            .iter()
            .map(String::as_str)
            .filter(|path| !path.is_empty() && !path.starts_with('*') && !path.starts_with('/'))
            .collect();
        if !non_nested.is_empty() {
            let listed = non_nested
                .iter()
                .map(|path| format!("- {path}"))
                .collect::<Vec<_>>()
                .join("\n");
            warn!(
                "Non-nested routes must include a leading slash character. \
                 Fix the following routes: \n{listed}"
            );
        }

        debug!(paths = self.path_list.len(), names = self.name_map.len(), "route table compiled");
    }

    pub fn get(&self, id: RecordId) -> Option<Rc<RouteRecord>> {
        self.records.get(id.index()).cloned()
    }

    pub fn by_path(&self, path: &str) -> Option<Rc<RouteRecord>> {
        self.path_map.get(path).and_then(|id| self.get(*id))
    }

    pub fn by_name(&self, name: &str) -> Option<Rc<RouteRecord>> {
        self.name_map.get(name).and_then(|id| self.get(*id))
    }

    pub fn path_list(&self) -> &[String] {
        &self.path_list
    }

    /// 按匹配优先级列出记录。
    pub fn records(&self) -> Vec<Rc<RouteRecord>> {
        self.path_list
            .iter()
            .filter_map(|path| self.by_path(path))
            .collect()
    }

    /// 根到叶的祖先链。
    pub fn matched_chain(&self, leaf: &Rc<RouteRecord>) -> Vec<Rc<RouteRecord>> {
        let mut chain = vec![leaf.clone()];
        let mut parent = leaf.parent;
        while let Some(record) = parent.and_then(|id| self.get(id)) {
            parent = record.parent;
            chain.push(record);
        }
        chain.reverse();
        chain
    }

    fn add_route_record(
        &mut self,
        route: &RouteConfig,
        parent: Option<RecordId>,
        match_as: Option<String>,
    ) -> Result<RecordId, ConfigError> {
        let Some(path) = route.path.as_deref() else {
            return Err(ConfigError::MissingPath {
                name: route.name.clone(),
            });
        };
        if let Some(id) = route.components.values().find_map(|slot| match slot {
            ComponentSlot::Unresolved(id) => Some(id.clone()),
            _ => None,
        }) {
            return Err(ConfigError::StringComponent {
                path: path.to_owned(),
                id,
            });
        }
        if !path.is_ascii() {
            warn!(
                "Route with path \"{path}\" contains unencoded characters, make sure your path \
                 is correctly encoded before passing it to the router. Use encodeURI to encode \
                 static segments of your path."
            );
        }

        let parent_path = parent.and_then(|id| self.get(id)).map(|p| p.path.clone());
        let normalized = normalize_path(path, parent_path.as_deref(), route.strict);
        let options = PatternOptions {
            case_sensitive: route.case_sensitive.unwrap_or(false),
            strict: route.strict,
        };
        let pattern = PathPattern::compile(&normalized, options).map_err(|source| {
            ConfigError::InvalidPattern {
                path: normalized.clone(),
                source,
            }
        })?;

        let id = RecordId(self.records.len() as u32);
        let record = Rc::new(RouteRecord {
            id,
            path: normalized.clone(),
            pattern,
            components: RefCell::new(route.components.clone()),
            alias: route.alias.clone(),
            instances: RefCell::new(BTreeMap::new()),
            entered_cbs: RefCell::new(BTreeMap::new()),
            name: route.name.clone(),
            parent,
            match_as: match_as.clone(),
            redirect: route.redirect.clone(),
            before_enter: route.before_enter.clone(),
            meta: route.meta.clone(),
            props: route.props.clone(),
        });
        self.records.push(record);

        if let Some(name) = &route.name {
            let has_default_child = route
                .children
                .iter()
                .any(|child| matches!(child.path.as_deref(), Some("") | Some("/")));
            if route.redirect.is_none() && has_default_child {
                warn!(
                    "Named Route '{name}' has a default child route. When navigating to this \
                     named route, the default child route will not be rendered. Remove the name \
                     from this route and use the name of the default child route for named links \
                     instead."
                );
            }
        }

        for child in &route.children {
            let child_path = child.path.as_deref().unwrap_or_default();
            let child_match_as = match_as
                .as_deref()
                .map(|target| clean_path(&format!("{target}/{child_path}")));
            self.add_route_record(child, Some(id), child_match_as)?;
        }

        if !self.path_map.contains_key(&normalized) {
            self.path_list.push(normalized.clone());
            self.path_map.insert(normalized.clone(), id);
        }

        for alias in &route.alias {
            if alias == path {
                warn!(
                    "Found an alias with the same value as the path: \"{path}\". \
                     You have to remove that alias. It will be ignored."
                );
                continue;
            }
            let alias_route = RouteConfig {
                path: Some(alias.clone()),
                components: route.components.clone(),
                children: route.children.clone(),
                before_enter: route.before_enter.clone(),
                meta: route.meta.clone(),
                props: route.props.clone(),
                case_sensitive: route.case_sensitive,
                strict: route.strict,
                ..RouteConfig::default()
            };
            let target = if normalized.is_empty() {
                "/".to_owned()
            } else {
                normalized.clone()
            };
            self.add_route_record(&alias_route, parent, Some(target))?;
        }

        if let Some(name) = &route.name {
            if !self.name_map.contains_key(name) {
                self.name_map.insert(name.clone(), id);
            } else if match_as.is_none() {
                warn!(
                    "Duplicate named routes definition: \
                     {{ name: \"{name}\", path: \"{normalized}\" }}"
                );
            }
        }

        Ok(id)
    }
}

/// 非 strict 时去掉末尾 `/`；绝对路径原样保留；相对路径拼到父路径之后。
fn normalize_path(path: &str, parent: Option<&str>, strict: bool) -> String {
    let path = if strict {
        path
    } else {
        path.strip_suffix('/').unwrap_or(path)
    };
    if path.starts_with('/') {
        return path.to_owned();
    }
    match parent {
        Some(parent) => clean_path(&format!("{parent}/{path}")),
        None => path.to_owned(),
    }
}
