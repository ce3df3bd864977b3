use super::{App, ResourceStore, StoreError};
use crate::contract::Contract;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// In-memory implementation of ResourceStore
///
/// Listing order follows insertion order so that responses are stable.
#[derive(Default)]
pub struct InMemoryStore {
    apps: RwLock<Table<App>>,
    contracts: RwLock<Table<Arc<Contract>>>,
}

struct Table<T> {
    order: Vec<String>,
    rows: HashMap<String, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            rows: HashMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn insert_new(&mut self, id: &str, row: T, what: &str) -> Result<(), StoreError> {
        if self.rows.contains_key(id) {
            return Err(StoreError::Conflict(format!("{what} {id}")));
        }
        self.order.push(id.to_string());
        self.rows.insert(id.to_string(), row);
        Ok(())
    }

    fn remove(&mut self, id: &str, what: &str) -> Result<T, StoreError> {
        let row = self
            .rows
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(format!("{what} {id}")))?;
        self.order.retain(|key| key != id);
        Ok(row)
    }
}

/// Every version needs a `v`, unique within the app.
fn check_versions(app: &App) -> Result<(), StoreError> {
    let mut seen = HashSet::new();
    for version in &app.versions {
        if version.v.is_empty() {
            return Err(StoreError::Invalid("version: `v` is required".to_string()));
        }
        if !seen.insert(version.v.as_str()) {
            return Err(StoreError::Conflict(format!("version {}", version.v)));
        }
    }
    Ok(())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<dyn ResourceStore> {
        Arc::new(Self::new())
    }
}

impl ResourceStore for InMemoryStore {
    fn list_apps(&self) -> Vec<String> {
        self.apps.read().order.clone()
    }

    fn get_app(&self, id: &str) -> Result<App, StoreError> {
        self.apps
            .read()
            .rows
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("app {id}")))
    }

    fn create_app(&self, mut app: App) -> Result<App, StoreError> {
        if app.id.is_empty() {
            app.id = uuid::Uuid::new_v4().to_string();
        }
        if app.name.is_empty() {
            app.name = app.id.clone();
        }
        check_versions(&app)?;
        for version in &mut app.versions {
            version.parent = Some(app.id.clone());
        }
        self.apps.write().insert_new(&app.id.clone(), app.clone(), "app")?;
        Ok(app)
    }

    fn update_app(&self, mut app: App) -> Result<App, StoreError> {
        check_versions(&app)?;
        let mut apps = self.apps.write();
        let slot = apps
            .rows
            .get_mut(&app.id)
            .ok_or_else(|| StoreError::NotFound(format!("app {}", app.id)))?;
        for version in &mut app.versions {
            version.parent = Some(app.id.clone());
        }
        *slot = app.clone();
        Ok(app)
    }

    fn delete_app(&self, id: &str) -> Result<App, StoreError> {
        self.apps.write().remove(id, "app")
    }

    fn modify_app(
        &self,
        id: &str,
        f: &mut dyn FnMut(&mut App) -> Result<(), StoreError>,
    ) -> Result<App, StoreError> {
        let mut apps = self.apps.write();
        let app = apps
            .rows
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("app {id}")))?;
        // Work on a copy so a failing edit leaves the record untouched.
        let mut edited = app.clone();
        f(&mut edited)?;
        *app = edited.clone();
        Ok(edited)
    }

    fn list_contracts(&self) -> Vec<String> {
        self.contracts.read().order.clone()
    }

    fn get_contract(&self, id: &str) -> Result<Arc<Contract>, StoreError> {
        self.contracts
            .read()
            .rows
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("contract {id}")))
    }

    fn create_contract(&self, contract: Contract) -> Result<Arc<Contract>, StoreError> {
        let contract = Arc::new(contract);
        self.contracts
            .write()
            .insert_new(&contract.id, Arc::clone(&contract), "contract")?;
        Ok(contract)
    }

    fn update_contract(&self, contract: Contract) -> Result<Arc<Contract>, StoreError> {
        let mut contracts = self.contracts.write();
        let slot = contracts
            .rows
            .get_mut(&contract.id)
            .ok_or_else(|| StoreError::NotFound(format!("contract {}", contract.id)))?;
        let contract = Arc::new(contract);
        *slot = Arc::clone(&contract);
        Ok(contract)
    }

    fn delete_contract(&self, id: &str) -> Result<Arc<Contract>, StoreError> {
        self.contracts.write().remove(id, "contract")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ContractCompiler;
    use crate::store::Version;

    #[test]
    fn test_app_crud() {
        let store = InMemoryStore::new();
        let app = store.create_app(App::new("shop", "/shop")).unwrap();
        assert_eq!(app.name, "shop");
        assert_eq!(
            store.create_app(App::new("shop", "/other")),
            Err(StoreError::Conflict("app shop".into()))
        );

        let generated = store.create_app(App::default()).unwrap();
        assert!(uuid::Uuid::parse_str(&generated.id).is_ok());
        assert_eq!(store.list_apps(), vec!["shop".to_string(), generated.id.clone()]);

        let mut changed = app.clone();
        changed.servers.push("http://localhost:1".into());
        store.update_app(changed).unwrap();
        assert_eq!(store.get_app("shop").unwrap().servers.len(), 1);

        store.delete_app("shop").unwrap();
        assert_eq!(store.get_app("shop").unwrap_err().status_code(), 404);
        assert!(store.update_app(App::new("shop", "/")).is_err());
    }

    #[test]
    fn test_version_crud() {
        let store = InMemoryStore::new();
        store.create_app(App::new("shop", "/shop")).unwrap();

        let v1 = store.create_version("shop", Version::new("1")).unwrap();
        assert_eq!(v1.parent.as_deref(), Some("shop"));
        assert_eq!(
            store.create_version("shop", Version::new("1")).unwrap_err().status_code(),
            409
        );
        assert_eq!(
            store.create_version("shop", Version::new("")).unwrap_err().status_code(),
            400
        );

        store
            .update_version("shop", Version::new("1").with_contracts(["c1"]))
            .unwrap();
        assert_eq!(store.get_version("shop", "1").unwrap().contracts, vec!["c1"]);
        assert!(store.update_version("shop", Version::new("9")).is_err());

        store.delete_version("shop", "1").unwrap();
        assert!(store.get_version("shop", "1").is_err());
        assert_eq!(store.delete_version("shop", "1").unwrap_err().status_code(), 404);
    }

    #[test]
    fn test_app_versions_must_be_unique() {
        let store = InMemoryStore::new();
        let duplicated = App::new("shop", "/shop")
            .with_version(Version::new("1"))
            .with_version(Version::new("1"));
        assert_eq!(
            store.create_app(duplicated.clone()),
            Err(StoreError::Conflict("version 1".into()))
        );
        assert!(store.get_app("shop").is_err());

        let unnamed = App::new("shop", "/shop").with_version(Version::default());
        assert_eq!(store.create_app(unnamed).unwrap_err().status_code(), 400);

        store
            .create_app(App::new("shop", "/shop").with_version(Version::new("1")))
            .unwrap();
        assert_eq!(store.update_app(duplicated).unwrap_err().status_code(), 409);
        assert_eq!(store.get_app("shop").unwrap().version_numbers(), vec!["1"]);
    }

    #[test]
    fn test_failed_modify_leaves_app_unchanged() {
        let store = InMemoryStore::new();
        store.create_app(App::new("shop", "/shop")).unwrap();
        let result = store.modify_app("shop", &mut |app| {
            app.base_path = "/changed".into();
            Err(StoreError::Invalid("nope".into()))
        });
        assert!(result.is_err());
        assert_eq!(store.get_app("shop").unwrap().base_path, "/shop");
    }

    #[test]
    fn test_concurrent_version_creation_keeps_all() {
        let store = Arc::new(InMemoryStore::new());
        store.create_app(App::new("shop", "/shop")).unwrap();
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.create_version("shop", Version::new(i.to_string())))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(store.get_app("shop").unwrap().versions.len(), 16);
    }

    #[test]
    fn test_contract_crud() {
        let store = InMemoryStore::new();
        let compiler = ContractCompiler::default();
        let contract = compiler.compile("{id: 'c1', request: {urlPath: '/a'}}").unwrap();
        store.create_contract(contract.clone()).unwrap();
        assert_eq!(store.create_contract(contract).unwrap_err().status_code(), 409);

        let replacement = compiler.compile("{id: 'c1', request: {urlPath: '/b'}}").unwrap();
        store.update_contract(replacement.clone()).unwrap();
        assert_eq!(*store.get_contract("c1").unwrap(), replacement);
        assert_eq!(store.list_contracts(), vec!["c1".to_string()]);

        store.delete_contract("c1").unwrap();
        assert!(store.get_contract("c1").is_err());
    }
}
