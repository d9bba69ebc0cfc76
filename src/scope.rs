//! Ownership scoping.
//!
//! Every read or write of a farm-owned row goes through [`Scoped::owned_by`],
//! so a row that is not reachable from the acting farmer behaves exactly like
//! a row that does not exist.

use sea_orm::{
    sea_query::Query, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Select,
};

use crate::entities::{activity, crop, farmer, field, secure_route, weather_record};
use crate::error::AppError;

pub trait Scoped: EntityTrait {
    /// Name used in "not found" responses.
    const LABEL: &'static str;

    fn id_column() -> Self::Column;

    /// Rows reachable from `actor`, directly or through a Field chain.
    fn owned_by(actor: i32) -> Select<Self>;

    fn owned_by_id(actor: i32, id: i32) -> Select<Self> {
        Self::owned_by(actor).filter(Self::id_column().eq(id))
    }
}

pub async fn find_owned<E: Scoped>(
    db: &DatabaseConnection,
    actor: i32,
    id: i32,
) -> Result<E::Model, AppError> {
    E::owned_by_id(actor, id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound(E::LABEL))
}

impl Scoped for farmer::Entity {
    const LABEL: &'static str = "Farmer";

    fn id_column() -> Self::Column {
        farmer::Column::Id
    }

    fn owned_by(actor: i32) -> Select<Self> {
        farmer::Entity::find().filter(farmer::Column::Id.eq(actor))
    }
}

impl Scoped for field::Entity {
    const LABEL: &'static str = "Field";

    fn id_column() -> Self::Column {
        field::Column::Id
    }

    fn owned_by(actor: i32) -> Select<Self> {
        field::Entity::find().filter(field::Column::FarmerId.eq(actor))
    }
}

impl Scoped for crop::Entity {
    const LABEL: &'static str = "Crop";

    fn id_column() -> Self::Column {
        crop::Column::Id
    }

    // crop -> field -> farmer
    fn owned_by(actor: i32) -> Select<Self> {
        crop::Entity::find().filter(
            crop::Column::FieldId.in_subquery(
                Query::select()
                    .column(field::Column::Id)
                    .from(field::Entity)
                    .and_where(field::Column::FarmerId.eq(actor))
                    .to_owned(),
            ),
        )
    }
}

impl Scoped for activity::Entity {
    const LABEL: &'static str = "Activity";

    fn id_column() -> Self::Column {
        activity::Column::Id
    }

    fn owned_by(actor: i32) -> Select<Self> {
        activity::Entity::find().filter(activity::Column::FarmerId.eq(actor))
    }
}

impl Scoped for weather_record::Entity {
    const LABEL: &'static str = "Weather record";

    fn id_column() -> Self::Column {
        weather_record::Column::Id
    }

    fn owned_by(actor: i32) -> Select<Self> {
        weather_record::Entity::find().filter(weather_record::Column::FarmerId.eq(actor))
    }
}

impl Scoped for secure_route::Entity {
    const LABEL: &'static str = "Secure route";

    fn id_column() -> Self::Column {
        secure_route::Column::Id
    }

    fn owned_by(actor: i32) -> Select<Self> {
        secure_route::Entity::find().filter(secure_route::Column::FarmerId.eq(actor))
    }
}
