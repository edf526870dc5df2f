use crate::k8s_api::{ConfigMapWithMeta, NodeWithMeta, Unknown};
use anyhow::{bail, Context, Result};
use prost::Message;
use serde_json::Value;

const K8S_PROTOBUF_MAGIC: &[u8] = b"k8s\x00";

/// Turns a raw etcd value into JSON. Protobuf-encoded objects are unwrapped from their envelope,
/// anything else is assumed to already be JSON and is returned as is.
pub(crate) fn decode(data: &[u8]) -> Result<Vec<u8>> {
    if !data.starts_with(K8S_PROTOBUF_MAGIC) {
        return Ok(data.to_vec());
    }

    let unknown = Unknown::decode(&data[K8S_PROTOBUF_MAGIC.len()..]).context("decoding protobuf envelope")?;
    let kind = unknown
        .type_meta
        .as_ref()
        .and_then(|type_meta| type_meta.kind.clone())
        .context("protobuf envelope has no kind")?;

    Ok(match kind.as_str() {
        "ConfigMap" => serde_json::to_vec(&ConfigMapWithMeta::try_from(unknown)?)?,
        "Node" => serde_json::to_vec(&NodeWithMeta::try_from(unknown)?)?,
        _ => bail!("unsupported protobuf kind {}", kind),
    })
}

/// The inverse of [decode]. Only ConfigMaps are written back as protobuf, the apiserver reads
/// JSON for every other kind just as well.
pub(crate) fn encode(data: &[u8]) -> Result<Vec<u8>> {
    let value: Value = serde_json::from_slice(data)?;
    let kind = value
        .pointer("/kind")
        .context("missing kind")?
        .as_str()
        .context("kind is not a string")?;

    let mut result = K8S_PROTOBUF_MAGIC.to_vec();

    result.extend(
        match kind {
            "ConfigMap" => Unknown::from(serde_json::from_slice::<ConfigMapWithMeta>(data)?),
            _ => return Ok(data.to_vec()),
        }
        .encode_to_vec(),
    );

    Ok(result)
}
