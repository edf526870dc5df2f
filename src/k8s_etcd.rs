use crate::{etcd_encoding, locations::K8sResourceLocation};
use anyhow::{Context, Result};
use etcd_client::Client as EtcdClient;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::Mutex;

// An etcd client wrapper with an in-memory cache in front of it. Reads are served from memory,
// with fallback to actual etcd. Writes go to memory and straight through to etcd, transparently
// encoding values the way the apiserver expects them. Without an etcd client (or in dry-run mode)
// writes stay in memory, which is also what the tests rely on.
pub(crate) struct InMemoryK8sEtcd {
    pub(crate) etcd_client: Option<Mutex<EtcdClient>>,
    etcd_prefix: String,
    dry_run: bool,
    etcd_keyvalue_hashmap: Mutex<HashMap<String, Vec<u8>>>,
    written_keys: Mutex<HashSet<String>>,
}

pub(crate) struct EtcdResult {
    pub(crate) key: String,
    pub(crate) value: Vec<u8>,
}

impl InMemoryK8sEtcd {
    pub(crate) fn new(etcd_client: Option<EtcdClient>, etcd_prefix: &str, dry_run: bool) -> Self {
        Self {
            etcd_client: etcd_client.map(Mutex::new),
            etcd_prefix: etcd_prefix.trim_end_matches('/').to_string(),
            dry_run,
            etcd_keyvalue_hashmap: Mutex::new(HashMap::new()),
            written_keys: Mutex::new(HashSet::new()),
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}/{}", self.etcd_prefix, key)
    }

    pub(crate) async fn get(&self, key: &str) -> Result<Option<EtcdResult>> {
        {
            let hashmap = self.etcd_keyvalue_hashmap.lock().await;
            if let Some(value) = hashmap.get(key) {
                return Ok(Some(EtcdResult {
                    key: key.to_string(),
                    value: value.clone(),
                }));
            }
        }

        let etcd_client = match &self.etcd_client {
            Some(etcd_client) => etcd_client,
            None => return Ok(None),
        };

        let full_key = self.full_key(key);
        let get_result = etcd_client
            .lock()
            .await
            .get(full_key.as_bytes(), None)
            .await
            .with_context(|| format!("getting key {:?} from etcd", full_key))?;

        let raw_etcd_value = match get_result.kvs().first() {
            Some(kv) => kv.value(),
            None => return Ok(None),
        };

        let decoded_value = etcd_encoding::decode(raw_etcd_value).with_context(|| format!("decoding value of key {:?}", full_key))?;
        self.etcd_keyvalue_hashmap
            .lock()
            .await
            .insert(key.to_string(), decoded_value.clone());

        Ok(Some(EtcdResult {
            key: key.to_string(),
            value: decoded_value,
        }))
    }

    pub(crate) async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        if let Some(etcd_client) = &self.etcd_client {
            if !self.dry_run {
                let full_key = self.full_key(key);
                let encoded_value = etcd_encoding::encode(&value).with_context(|| format!("encoding value of key {:?}", full_key))?;

                etcd_client
                    .lock()
                    .await
                    .put(full_key.as_bytes(), encoded_value, None)
                    .await
                    .with_context(|| format!("putting key {:?} to etcd", full_key))?;
            }
        }

        self.etcd_keyvalue_hashmap.lock().await.insert(key.to_string(), value);
        self.written_keys.lock().await.insert(key.to_string());

        Ok(())
    }

    /// Every resource written through this client so far, keyed by its location
    pub(crate) async fn written_resources(&self) -> Result<BTreeMap<String, Value>> {
        let hashmap = self.etcd_keyvalue_hashmap.lock().await;

        self.written_keys
            .lock()
            .await
            .iter()
            .map(|key| {
                let value: Value = serde_json::from_slice(hashmap.get(key).with_context(|| format!("written key {:?} not in cache", key))?)
                    .with_context(|| format!("deserializing value of key {:?}", key))?;
                let location = K8sResourceLocation::try_from(&value).with_context(|| format!("locating value of key {:?}", key))?;

                Ok((location.to_string(), value))
            })
            .collect()
    }
}

pub(crate) async fn get_etcd_json(client: &InMemoryK8sEtcd, k8slocation: &K8sResourceLocation) -> Result<Option<Value>> {
    let etcd_result = client
        .get(&k8slocation.as_etcd_key())
        .await
        .with_context(|| format!("etcd get {}", k8slocation))?;

    match etcd_result {
        Some(etcd_result) => Ok(Some(
            serde_json::from_slice(&etcd_result.value).with_context(|| format!("deserializing value of key {:?}", etcd_result.key))?,
        )),
        None => Ok(None),
    }
}

pub(crate) async fn put_etcd_json(client: &InMemoryK8sEtcd, k8slocation: &K8sResourceLocation, value: Value) -> Result<()> {
    client
        .put(&k8slocation.as_etcd_key(), serde_json::to_vec(&value)?)
        .await
        .with_context(|| format!("etcd put {}", k8slocation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_in_memory_put_get() {
        let etcd = InMemoryK8sEtcd::new(None, "/registry/", false);
        let location = K8sResourceLocation::new(Some("kube-system"), "ConfigMap", "kubeadm-config", "v1");

        assert!(get_etcd_json(&etcd, &location).await.unwrap().is_none());

        let config_map = json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "kubeadm-config", "namespace": "kube-system"},
            "data": {"MasterConfiguration": "nodeName: node-1\n"},
        });

        put_etcd_json(&etcd, &location, config_map.clone()).await.unwrap();

        assert_eq!(get_etcd_json(&etcd, &location).await.unwrap(), Some(config_map.clone()));
        assert_eq!(
            etcd.written_resources().await.unwrap(),
            BTreeMap::from([("ConfigMap/kube-system:kubeadm-config".to_string(), config_map)])
        );
    }

    #[test]
    fn test_full_key() {
        assert_eq!(
            InMemoryK8sEtcd::new(None, "/registry/", false).full_key("minions/node-1"),
            "/registry/minions/node-1"
        );
        assert_eq!(
            InMemoryK8sEtcd::new(None, "/kubernetes.io", false).full_key("configmaps/kube-system/kubeadm-config"),
            "/kubernetes.io/configmaps/kube-system/kubeadm-config"
        );
    }
}
