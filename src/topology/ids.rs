use tracing::warn;

/// First id handed out by automatic id allocation.
///
/// User-supplied ids at or above this value may collide with automatic ones.
pub const AUTO_ID_START: i32 = 10000;

/// Sequential uid and auto-id source for one kind of entity.
#[derive(Debug, Clone)]
pub struct IdCounter {
    next_uid: usize,
    next_auto_id: i32,
}

impl Default for IdCounter {
    fn default() -> Self {
        Self {
            next_uid: 0,
            next_auto_id: AUTO_ID_START,
        }
    }
}

impl IdCounter {
    /// Allocates `(uid, id)`.
    ///
    /// A requested id of `0` is replaced by the next automatic id. Uids are
    /// never reused, even across [`reset`](Self::reset).
    pub fn allocate(&mut self, requested: i32, kind: &'static str) -> (usize, i32) {
        let uid = self.next_uid;
        self.next_uid += 1;

        let id = if requested == 0 {
            let id = self.next_auto_id;
            self.next_auto_id += 1;
            id
        } else {
            if requested >= AUTO_ID_START {
                warn!(
                    id = requested,
                    "{kind} id is in the automatic id range and may collide"
                );
            }
            requested
        };
        (uid, id)
    }

    /// Restarts automatic ids at [`AUTO_ID_START`].
    pub fn reset(&mut self) {
        self.next_auto_id = AUTO_ID_START;
    }
}

/// Build-time id context for the geometry entities.
#[derive(Debug, Clone, Default)]
pub struct EntityIds {
    pub surfaces: IdCounter,
    pub cells: IdCounter,
}

impl EntityIds {
    /// Restarts automatic ids of every entity kind.
    pub fn reset(&mut self) {
        self.surfaces.reset();
        self.cells.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_ids_increase_from_start() {
        let mut ids = IdCounter::default();
        let allocated: Vec<i32> = (0..50).map(|_| ids.allocate(0, "surface").1).collect();
        assert_eq!(allocated[0], AUTO_ID_START);
        assert!(allocated.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn user_ids_do_not_consume_auto_ids() {
        let mut ids = IdCounter::default();
        assert_eq!(ids.allocate(5, "surface").1, 5);
        assert_eq!(ids.allocate(0, "surface").1, AUTO_ID_START);
    }

    #[test]
    fn reset_restarts_auto_ids_but_not_uids() {
        let mut ids = IdCounter::default();
        let (uid_a, _) = ids.allocate(0, "cell");
        ids.allocate(0, "cell");
        ids.reset();
        let (uid_b, id_b) = ids.allocate(0, "cell");
        assert_eq!(id_b, AUTO_ID_START);
        assert!(uid_b > uid_a);
    }
}
