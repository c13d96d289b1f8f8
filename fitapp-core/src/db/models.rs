use diesel::Insertable;

use crate::db::schema;

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::storage)]
pub struct NewStorageEntry<'a> {
    pub key: &'a str,
    pub value: &'a str,
    pub updated_at: i64,
}
