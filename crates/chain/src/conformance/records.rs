use super::{create_record, CIPHERTEXT, PROOF};
use crate::{ContractConnector, GatewayError};

pub(super) async fn created_record_is_enumerated<C: ContractConnector>(
    connector: &C,
) -> Result<(), String> {
    create_record(connector, "conf-1").await?;
    create_record(connector, "conf-2").await?;
    let reader = connector.read_only().await.ok_or("no read-only handle")?;
    let ids = reader
        .get_all_business_ids()
        .await
        .map_err(|e| format!("enumerate: {e}"))?;
    for expected in ["conf-1", "conf-2"] {
        if !ids.iter().any(|id| id == expected) {
            return Err(format!("{expected} missing from {ids:?}"));
        }
    }
    Ok(())
}

pub(super) async fn fields_round_trip_unverified<C: ContractConnector>(
    connector: &C,
) -> Result<(), String> {
    create_record(connector, "conf-1").await?;
    let reader = connector.read_only().await.ok_or("no read-only handle")?;
    let data = reader
        .get_business_data("conf-1")
        .await
        .map_err(|e| format!("fetch: {e}"))?;
    if data.name != "Sample" || data.description != "conformance record" {
        return Err(format!("text fields not stored: {data:?}"));
    }
    if data.public_value1 != 7 || data.public_value2 != 0 {
        return Err(format!("public values not stored: {data:?}"));
    }
    if data.is_verified {
        return Err("new record must start unverified".to_string());
    }
    reader
        .get_encrypted_value("conf-1")
        .await
        .map_err(|e| format!("encrypted value handle: {e}"))?;
    Ok(())
}

pub(super) async fn unknown_record_is_not_found<C: ContractConnector>(
    connector: &C,
) -> Result<(), String> {
    let reader = connector.read_only().await.ok_or("no read-only handle")?;
    match reader.get_business_data("conf-missing").await {
        Err(GatewayError::RecordNotFound { .. }) => Ok(()),
        Err(other) => Err(format!("expected RecordNotFound, got {other}")),
        Ok(data) => Err(format!("expected RecordNotFound, got {data:?}")),
    }
}

pub(super) async fn duplicate_id_is_refused<C: ContractConnector>(
    connector: &C,
) -> Result<(), String> {
    create_record(connector, "conf-1").await?;
    let writer = connector.with_signer().await.ok_or("no signer handle")?;
    let outcome = match writer
        .create_business_data("conf-1", "Again", &CIPHERTEXT, PROOF, 3, 0, "")
        .await
    {
        Ok(tx) => tx.wait().await.map(|_| ()),
        Err(e) => Err(e),
    };
    match outcome {
        Ok(()) => Err("second create with the same id succeeded".to_string()),
        Err(_) => Ok(()),
    }
}
