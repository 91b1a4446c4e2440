use super::super::*;

impl<S: Store> Projection<S> {
    /// Open a randomness request. Request ids are coordinator-unique, so an existing
    /// row under the same id is an integrity defect, not a retry.
    pub(in crate::projection) async fn handle_request_sent(
        &mut self,
        meta: &EventMeta,
        request_id: U256,
        requester: Address,
    ) -> Result<Outcome> {
        let key = Key::Request(request_id);
        if self.get(&key).await?.is_some() {
            return Ok(Outcome::Rejected(RejectReason::Collision { key }));
        }
        let request = RandomnessRequest::new(requester, meta.tx_hash, meta.timestamp);
        self.stage(key, Value::Request(request));
        Ok(Outcome::Applied)
    }

    /// Attach delivered words to an open request and seal it.
    ///
    /// A fulfillment for an unknown id lands when the request predates the replayed
    /// window; it is dropped. A fulfillment for a sealed request is dropped too: the
    /// first delivery wins and later ones never rewrite it.
    pub(in crate::projection) async fn handle_request_fulfilled(
        &mut self,
        meta: &EventMeta,
        request_id: U256,
        random_words: &[U256],
    ) -> Result<Outcome> {
        let mut request = match self.get(&Key::Request(request_id)).await? {
            Some(Value::Request(request)) => request,
            _ => return Ok(Outcome::Dropped(DropReason::RequestMissing { request_id })),
        };
        if request.fulfilled {
            return Ok(Outcome::Dropped(DropReason::AlreadyFulfilled { request_id }));
        }
        request.fulfilled = true;
        request.random_words = random_words.to_vec();
        request.fulfilled_at = Some(meta.timestamp);
        self.stage(Key::Request(request_id), Value::Request(request));
        Ok(Outcome::Applied)
    }

    /// Overwrite a consumer contract's authorization flag. Last write wins; there is
    /// no history to preserve.
    pub(in crate::projection) async fn handle_authorization_changed(
        &mut self,
        meta: &EventMeta,
        contract: Address,
        authorized: bool,
    ) -> Result<Outcome> {
        self.stage(
            Key::Authorization(contract),
            Value::Authorization(VrfAuthorization {
                authorized,
                updated_at: meta.timestamp,
            }),
        );
        Ok(Outcome::Applied)
    }
}
