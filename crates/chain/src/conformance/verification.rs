use super::create_record;
use crate::{encode_clear_values, ContractConnector};

async fn verify<C: ContractConnector>(connector: &C, id: &str, value: u64) -> Result<(), String> {
    let writer = connector.with_signer().await.ok_or("no signer handle")?;
    let tx = writer
        .verify_decryption(id, &encode_clear_values(&[value]), b"decryption-proof")
        .await
        .map_err(|e| e.to_string())?;
    tx.wait().await.map_err(|e| e.to_string())?;
    Ok(())
}

pub(super) async fn verification_stores_clear_value<C: ContractConnector>(
    connector: &C,
) -> Result<(), String> {
    create_record(connector, "conf-1").await?;
    verify(connector, "conf-1", 42).await?;
    let reader = connector.read_only().await.ok_or("no read-only handle")?;
    let data = reader
        .get_business_data("conf-1")
        .await
        .map_err(|e| format!("fetch: {e}"))?;
    if !data.is_verified {
        return Err("record not marked verified".to_string());
    }
    if data.decrypted_value != 42 {
        return Err(format!("expected 42, stored {}", data.decrypted_value));
    }
    Ok(())
}

pub(super) async fn second_verification_is_already_verified<C: ContractConnector>(
    connector: &C,
) -> Result<(), String> {
    create_record(connector, "conf-1").await?;
    verify(connector, "conf-1", 42).await?;

    let writer = connector.with_signer().await.ok_or("no signer handle")?;
    let outcome = match writer
        .verify_decryption("conf-1", &encode_clear_values(&[42]), b"decryption-proof")
        .await
    {
        Ok(tx) => tx.wait().await.map(|_| ()),
        Err(e) => Err(e),
    };
    match outcome {
        Ok(()) => Err("second verification succeeded".to_string()),
        Err(e) if e.is_already_verified() => Ok(()),
        Err(e) => Err(format!("expected an already-verified error, got {e}")),
    }
}
